/// Database row types. These map directly to SQLite rows and stay
/// independent of the bazaar-types wire models.

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

/// A product joined with its category name and picture filenames.
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub category: String,
    pub description: String,
    pub seller_id: i64,
    pub pictures: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct WishlistRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: String,
}

pub struct ChatRow {
    pub id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub created_at: String,
}

pub struct ChatMessageRow {
    pub id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub message: String,
    pub created_at: String,
}

pub struct ChatSummaryRow {
    pub chat: ChatRow,
    pub last_message: Option<ChatMessageRow>,
}

// -- Write inputs --

pub struct NewProduct<'a> {
    pub name: &'a str,
    pub price: i64,
    pub category: &'a str,
    pub description: &'a str,
    pub seller_id: i64,
}

/// Fields for an update. `None` keeps the stored value; the category is
/// always re-resolved.
pub struct ProductChanges<'a> {
    pub name: Option<&'a str>,
    pub price: Option<i64>,
    pub category: &'a str,
    pub description: Option<&'a str>,
}

pub struct NewPicture {
    pub name: String,
    pub url: String,
}
