//! Persistence seams consumed by the API services.
//!
//! `Database` implements every trait; services hold them as `Arc<dyn …>` so
//! tests can swap in doubles. Expected outcomes (missing rows, duplicates,
//! wrong owner) come back as `Option`/outcome enums. `Err` is reserved for
//! storage failures.

use anyhow::Result;

use crate::models::{
    CategoryRow, ChatMessageRow, ChatRow, ChatSummaryRow, NewPicture, NewProduct, ProductChanges,
    ProductRow, UserRow, WishlistRow,
};

/// Called inside a product transaction with the product id once its row is
/// written. Returns the pictures to insert. An `Err` rolls the transaction back.
pub type PictureAttacher<'a> = &'a mut dyn FnMut(i64) -> Result<Vec<NewPicture>>;

pub enum UpdateOutcome {
    /// `replaced_pictures` lists filenames detached by this update.
    Updated {
        product: ProductRow,
        replaced_pictures: Vec<String>,
    },
    UnknownCategory,
    NotFound,
    NotOwner,
}

pub enum DeleteOutcome {
    Deleted { pictures: Vec<String> },
    NotFound,
    NotOwner,
}

pub trait CategoryRepository: Send + Sync {
    fn list_categories(&self) -> Result<Vec<CategoryRow>>;
}

pub trait ProductRepository: Send + Sync {
    fn list_products(&self) -> Result<Vec<ProductRow>>;
    fn find_product(&self, id: i64) -> Result<Option<ProductRow>>;
    fn product_exists(&self, id: i64) -> Result<bool>;

    /// Resolve the category, insert the product and its pictures in one
    /// transaction. `Ok(None)` means the category name did not resolve and
    /// nothing was written.
    fn create_product(
        &self,
        product: &NewProduct<'_>,
        attach: PictureAttacher<'_>,
    ) -> Result<Option<ProductRow>>;

    /// Update a product owned by `seller_id`. When `attach` is given the
    /// product's pictures are replaced by what it returns.
    fn update_product(
        &self,
        id: i64,
        seller_id: i64,
        changes: &ProductChanges<'_>,
        attach: Option<PictureAttacher<'_>>,
    ) -> Result<UpdateOutcome>;

    fn delete_product(&self, id: i64, seller_id: i64) -> Result<DeleteOutcome>;
}

pub trait WishlistRepository: Send + Sync {
    /// Rows whose product no longer exists are skipped.
    fn list_wishlists(&self, user_id: i64) -> Result<Vec<WishlistRow>>;
    fn find_wishlist(&self, user_id: i64, product_id: i64) -> Result<Option<WishlistRow>>;
    /// `Ok(None)` when the (user, product) pair already exists.
    fn insert_wishlist(&self, user_id: i64, product_id: i64) -> Result<Option<WishlistRow>>;
    /// Returns whether a row was removed.
    fn delete_wishlist(&self, user_id: i64, product_id: i64) -> Result<bool>;
}

pub trait UserRepository: Send + Sync {
    /// `Ok(None)` when the email is already registered.
    fn create_user(&self, email: &str, password_hash: &str, name: &str) -> Result<Option<i64>>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>>;
    fn user_exists(&self, id: i64) -> Result<bool>;
}

pub trait ChatRepository: Send + Sync {
    /// Chats the user takes part in, most recent activity first.
    fn list_chats(&self, user_id: i64) -> Result<Vec<ChatSummaryRow>>;
    fn find_chat(&self, id: i64) -> Result<Option<ChatRow>>;
    /// Get or create the chat between a buyer and a seller.
    fn open_chat(&self, buyer_id: i64, seller_id: i64) -> Result<ChatRow>;
    fn chat_messages(&self, chat_id: i64) -> Result<Vec<ChatMessageRow>>;
    fn insert_chat_message(&self, chat_id: i64, user_id: i64, message: &str)
        -> Result<ChatMessageRow>;
}
