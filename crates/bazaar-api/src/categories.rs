use axum::{Json, extract::State};

use bazaar_types::api::CategoriesResponse;

use crate::convert;
use crate::error::ApiError;
use crate::run_blocking;
use crate::state::AppState;

/// GET /category
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = run_blocking(move || {
        let rows = state.categories.list_categories()?;
        Ok(rows.into_iter().map(convert::category).collect::<Vec<_>>())
    })
    .await?;
    Ok(Json(CategoriesResponse { categories }))
}
