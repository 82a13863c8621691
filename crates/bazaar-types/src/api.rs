use serde::{Deserialize, Serialize};

use crate::models::{Category, Chat, ChatMessage, Product, Wishlist};

// -- JWT Claims --

/// JWT claims issued by `/auth/*` and checked by the auth middleware.
/// `sub` is the user id the request acts as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub exp: usize,
}

// -- Errors --

/// Machine-readable error discriminator. Clients match on these strings,
/// so the serialized names must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationFailed,
    NotFound,
    AlreadyExists,
    Forbidden,
    Unauthorized,
    MethodNotAllowed,
    SystemError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub email: String,
    pub token: String,
}

// -- Products --

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductUpdatedResponse {
    pub message: String,
    pub data: Product,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

// -- Wishlist --

#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistCheckResponse {
    #[serde(rename = "isWishlist")]
    pub is_wishlist: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistsResponse {
    pub wishlists: Vec<Wishlist>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistResponse {
    pub wishlist: Wishlist,
}

// -- Chat --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenChatRequest {
    pub seller_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatsResponse {
    pub chats: Vec<Chat>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub chat: Chat,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    pub message: ChatMessage,
}
