use axum::{
    Extension, Json,
    extract::{Path, State},
};

use bazaar_types::api::{
    Claims, MessageResponse, WishlistCheckResponse, WishlistResponse, WishlistsResponse,
};

use crate::error::ApiError;
use crate::run_blocking;
use crate::state::AppState;

pub async fn check_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<String>,
) -> Result<Json<WishlistCheckResponse>, ApiError> {
    let is_wishlist = run_blocking(move || state.wishlist.check(&product_id, claims.sub)).await?;
    Ok(Json(WishlistCheckResponse { is_wishlist }))
}

pub async fn list_wishlists(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<WishlistsResponse>, ApiError> {
    let wishlists = run_blocking(move || state.wishlist.list(claims.sub)).await?;
    Ok(Json(WishlistsResponse { wishlists }))
}

pub async fn add_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<String>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let wishlist = run_blocking(move || state.wishlist.add(&product_id, claims.sub)).await?;
    Ok(Json(WishlistResponse { wishlist }))
}

pub async fn remove_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    run_blocking(move || state.wishlist.remove(&product_id, claims.sub)).await?;
    Ok(Json(MessageResponse::new("Wishlist successfully deleted")))
}
