pub mod chat;
pub mod products;
pub mod wishlist;

pub use chat::ChatService;
pub use products::ProductService;
pub use wishlist::WishlistService;
