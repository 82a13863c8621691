use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use bazaar_db::models::{CategoryRow, ChatMessageRow, ChatRow, ProductRow, WishlistRow};
use bazaar_types::models::{Category, Chat, ChatMessage, Product, Wishlist};

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC; anything unreadable becomes the epoch.
fn timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, what, e);
            DateTime::default()
        })
}

pub(crate) fn product(row: ProductRow) -> Product {
    let what = format!("product {}", row.id);
    Product {
        id: row.id,
        name: row.name,
        price: row.price,
        category: row.category,
        description: row.description,
        seller_id: row.seller_id,
        pictures: row.pictures,
        created_at: timestamp(&row.created_at, &what),
        updated_at: timestamp(&row.updated_at, &what),
    }
}

pub(crate) fn category(row: CategoryRow) -> Category {
    Category {
        id: row.id,
        name: row.name,
    }
}

pub(crate) fn wishlist(row: WishlistRow) -> Wishlist {
    Wishlist {
        id: row.id,
        user_id: row.user_id,
        product_id: row.product_id,
        created_at: timestamp(&row.created_at, &format!("wishlist {}", row.id)),
    }
}

pub(crate) fn chat_message(row: ChatMessageRow) -> ChatMessage {
    ChatMessage {
        id: row.id,
        chat_id: row.chat_id,
        user_id: row.user_id,
        created_at: timestamp(&row.created_at, &format!("chat message {}", row.id)),
        message: row.message,
    }
}

pub(crate) fn chat(row: ChatRow, last_message: Option<ChatMessage>, messages: Vec<ChatMessage>) -> Chat {
    Chat {
        id: row.id,
        buyer_id: row.buyer_id,
        seller_id: row.seller_id,
        last_message,
        messages,
        created_at: timestamp(&row.created_at, &format!("chat {}", row.id)),
    }
}
