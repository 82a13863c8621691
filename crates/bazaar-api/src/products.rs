use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};
use tracing::debug;

use bazaar_types::api::{
    Claims, MessageResponse, ProductResponse, ProductUpdatedResponse, ProductsResponse,
};

use crate::error::ApiError;
use crate::run_blocking;
use crate::state::AppState;
use crate::validation::{PictureUpload, ProductForm};

/// GET /product
pub async fn list_products(State(state): State<AppState>) -> Result<Json<ProductsResponse>, ApiError> {
    let products = run_blocking(move || state.products.list()).await?;
    Ok(Json(ProductsResponse { products }))
}

/// GET /product/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = run_blocking(move || state.products.get(&id)).await?;
    Ok(Json(ProductResponse { product }))
}

/// POST /product, multipart with the product fields and one or more
/// `pictures` file parts.
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let form = read_form(multipart?).await?;
    let product = run_blocking(move || state.products.create(form, claims.sub)).await?;
    Ok(Json(ProductResponse { product }))
}

/// PUT /product/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductUpdatedResponse>, ApiError> {
    let form = read_form(multipart?).await?;
    let product = run_blocking(move || state.products.update(&id, form, claims.sub)).await?;
    Ok(Json(ProductUpdatedResponse {
        message: "Product Updated".into(),
        data: product,
    }))
}

/// DELETE /product/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    run_blocking(move || state.products.delete(&id, claims.sub)).await?;
    Ok(Json(MessageResponse::new("Product Deleted")))
}

/// Collect the multipart body into a [`ProductForm`]. Nothing is checked
/// here beyond the multipart framing itself, except that an empty file part
/// without a filename (an unselected file input) counts as no picture.
async fn read_form(mut multipart: Multipart) -> Result<ProductForm, ApiError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "pictures" | "pictures[]" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if file_name.is_empty() && bytes.is_empty() {
                    debug!("Skipping empty picture part");
                    continue;
                }
                let file_name = if file_name.is_empty() {
                    "picture".to_string()
                } else {
                    file_name
                };
                form.pictures.push(PictureUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "name" => form.name = Some(field.text().await?),
            "price" => form.price = Some(field.text().await?),
            "category" => form.category = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            other => debug!("Ignoring unknown product field '{}'", other),
        }
    }

    Ok(form)
}
