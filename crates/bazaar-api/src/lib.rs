pub mod auth;
pub mod categories;
pub mod chat;
mod convert;
pub mod error;
pub mod images;
pub mod middleware;
pub mod products;
pub mod services;
pub mod state;
pub mod validation;
pub mod wishlist;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

/// Every HTTP route of the marketplace. Static files under `/uploads` are
/// mounted by the binary, which knows the upload directory.
pub fn router(state: AppState) -> Router {
    let body_limit = state.products.policy().body_limit();

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/category", get(categories::list_categories))
        .route("/product", get(products::list_products))
        .route("/product/{id}", get(products::get_product));

    let protected_routes = Router::new()
        .route("/product", post(products::create_product))
        .route(
            "/product/{id}",
            axum::routing::put(products::update_product).delete(products::delete_product),
        )
        .route("/wishlist", get(wishlist::list_wishlists))
        .route(
            "/wishlist/{product_id}",
            post(wishlist::add_wishlist).delete(wishlist::remove_wishlist),
        )
        .route("/wishlist/{product_id}/check", get(wishlist::check_wishlist))
        .route("/chat", get(chat::list_chats).post(chat::open_chat))
        .route("/chat/{chat_id}", get(chat::get_chat))
        .route("/chat/{chat_id}/messages", post(chat::send_message))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Run blocking storage work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::System(e.into())
    })?
}
