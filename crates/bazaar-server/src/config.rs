use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use bazaar_api::validation::PicturePolicy;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub upload_dir: PathBuf,
    pub public_url: String,
    pub pictures: PicturePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` returns the raw value of a `BAZAAR_*` variable, if set.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("BAZAAR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("BAZAAR_JWT_SECRET is unset or still a placeholder");
        }

        let defaults = PicturePolicy::default();
        let pictures = PicturePolicy {
            max_count: parse(&var("BAZAAR_MAX_PICTURES", &defaults.max_count.to_string()), "BAZAAR_MAX_PICTURES")?,
            max_bytes: parse(
                &var("BAZAAR_MAX_PICTURE_BYTES", &defaults.max_bytes.to_string()),
                "BAZAAR_MAX_PICTURE_BYTES",
            )?,
        };
        if pictures.max_count == 0 {
            bail!("BAZAAR_MAX_PICTURES must be at least 1");
        }

        Ok(Self {
            host: var("BAZAAR_HOST", "0.0.0.0"),
            port: parse(&var("BAZAAR_PORT", "8000"), "BAZAAR_PORT")?,
            db_path: var("BAZAAR_DB_PATH", "bazaar.db").into(),
            jwt_secret,
            token_ttl_days: parse(&var("BAZAAR_TOKEN_TTL_DAYS", "30"), "BAZAAR_TOKEN_TTL_DAYS")?,
            upload_dir: var("BAZAAR_UPLOAD_DIR", "./uploads").into(),
            public_url: var("BAZAAR_PUBLIC_URL", "http://localhost:8000"),
            pictures,
        })
    }
}

fn parse<T>(raw: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} has an invalid value '{}'", key, raw))
}
