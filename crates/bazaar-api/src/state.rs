use std::sync::Arc;

use bazaar_db::{CategoryRepository, Database, UserRepository};

use crate::images::ImageStore;
use crate::services::{ChatService, ProductService, WishlistService};
use crate::validation::PicturePolicy;

pub type AppState = Arc<AppStateInner>;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

pub struct AppStateInner {
    pub products: ProductService,
    pub wishlist: WishlistService,
    pub chats: ChatService,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub auth: AuthConfig,
}

impl AppStateInner {
    /// Wire every service to the one SQLite database.
    pub fn new(
        db: Arc<Database>,
        images: Arc<dyn ImageStore>,
        auth: AuthConfig,
        policy: PicturePolicy,
    ) -> AppState {
        Arc::new(Self {
            products: ProductService::new(db.clone(), images, policy),
            wishlist: WishlistService::new(db.clone(), db.clone()),
            chats: ChatService::new(db.clone(), db.clone()),
            categories: db.clone(),
            users: db,
            auth,
        })
    }
}
