use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::validation::Picture;

pub struct StoredImage {
    pub name: String,
    pub url: String,
}

/// Where product pictures end up. Calls are blocking; they run inside the
/// product transaction on a blocking thread.
pub trait ImageStore: Send + Sync {
    fn store(&self, picture: &Picture) -> Result<StoredImage>;
    /// Removing an image that is already gone succeeds.
    fn remove(&self, name: &str) -> Result<()>;
}

/// Stores each picture as a flat file `{dir}/{uuid}.{ext}`, served back
/// under `{public_url}/uploads/`.
pub struct DiskImageStore {
    dir: PathBuf,
    public_url: String,
}

impl DiskImageStore {
    pub async fn new(dir: PathBuf, public_url: &str) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ImageStore for DiskImageStore {
    fn store(&self, picture: &Picture) -> Result<StoredImage> {
        let name = format!("{}.{}", Uuid::new_v4(), picture.kind.extension());
        std::fs::write(self.dir.join(&name), &picture.bytes)?;

        let url = format!("{}/uploads/{}", self.public_url, name);
        Ok(StoredImage { name, url })
    }

    fn remove(&self, name: &str) -> Result<()> {
        match std::fs::remove_file(self.dir.join(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Image {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
