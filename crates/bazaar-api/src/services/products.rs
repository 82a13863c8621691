use std::sync::Arc;

use tracing::{info, warn};

use bazaar_db::models::{NewPicture, NewProduct, ProductChanges};
use bazaar_db::{DeleteOutcome, PictureAttacher, ProductRepository, UpdateOutcome};
use bazaar_types::models::Product;

use crate::convert;
use crate::error::ApiError;
use crate::images::ImageStore;
use crate::validation::{
    self, CATEGORY_REQUIRED, PRODUCT_ID_REQUIRED, Picture, PicturePolicy, ProductForm,
};

const PRODUCT_NOT_FOUND: &str = "Product not found";
const NOT_THE_SELLER: &str = "Only the seller can modify this product";

/// Product lifecycle: validation, category resolution, picture storage and
/// ownership rules on top of a [`ProductRepository`].
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    images: Arc<dyn ImageStore>,
    policy: PicturePolicy,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        images: Arc<dyn ImageStore>,
        policy: PicturePolicy,
    ) -> Self {
        Self {
            products,
            images,
            policy,
        }
    }

    pub fn policy(&self) -> &PicturePolicy {
        &self.policy
    }

    pub fn list(&self) -> Result<Vec<Product>, ApiError> {
        let rows = self.products.list_products()?;
        Ok(rows.into_iter().map(convert::product).collect())
    }

    pub fn get(&self, raw_id: &str) -> Result<Product, ApiError> {
        let id = validation::parse_id(raw_id, PRODUCT_ID_REQUIRED)?;
        self.products
            .find_product(id)?
            .map(convert::product)
            .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))
    }

    /// Everything is validated before the first write. The product row, its
    /// pictures and the stored files succeed or fail together.
    pub fn create(&self, form: ProductForm, seller_id: i64) -> Result<Product, ApiError> {
        let input = validation::product_input(form, &self.policy)?;

        let new_product = NewProduct {
            name: &input.name,
            price: input.price,
            category: &input.category,
            description: &input.description,
            seller_id,
        };

        let mut stored = Vec::new();
        let mut attach = self.attacher(&input.pictures, &mut stored);
        let result = self.products.create_product(&new_product, &mut attach);
        drop(attach);

        match result {
            Ok(Some(row)) => {
                info!(
                    "Product {} created by user {} with {} pictures",
                    row.id,
                    seller_id,
                    row.pictures.len()
                );
                Ok(convert::product(row))
            }
            Ok(None) => Err(ApiError::validation(CATEGORY_REQUIRED)),
            Err(e) => {
                self.discard(&stored);
                Err(e.into())
            }
        }
    }

    /// Attached pictures replace the current ones; without pictures they
    /// are left alone.
    pub fn update(&self, raw_id: &str, form: ProductForm, seller_id: i64) -> Result<Product, ApiError> {
        let id = validation::parse_id(raw_id, PRODUCT_ID_REQUIRED)?;
        let input = validation::product_changes(form, &self.policy)?;

        let changes = ProductChanges {
            name: input.name.as_deref(),
            price: input.price,
            category: &input.category,
            description: input.description.as_deref(),
        };

        let mut stored = Vec::new();
        let mut attacher = self.attacher(&input.pictures, &mut stored);
        let attach: Option<PictureAttacher<'_>> = if input.pictures.is_empty() {
            None
        } else {
            Some(&mut attacher)
        };
        let result = self.products.update_product(id, seller_id, &changes, attach);
        drop(attacher);

        match result {
            Ok(UpdateOutcome::Updated {
                product,
                replaced_pictures,
            }) => {
                self.discard(&replaced_pictures);
                info!("Product {} updated by user {}", id, seller_id);
                Ok(convert::product(product))
            }
            Ok(UpdateOutcome::UnknownCategory) => Err(ApiError::validation(CATEGORY_REQUIRED)),
            Ok(UpdateOutcome::NotFound) => Err(ApiError::not_found(PRODUCT_NOT_FOUND)),
            Ok(UpdateOutcome::NotOwner) => {
                warn!("User {} tried to update product {} they do not sell", seller_id, id);
                Err(ApiError::Forbidden(NOT_THE_SELLER.into()))
            }
            Err(e) => {
                self.discard(&stored);
                Err(e.into())
            }
        }
    }

    /// Wishlist rows pointing at the product are left in place.
    pub fn delete(&self, raw_id: &str, seller_id: i64) -> Result<(), ApiError> {
        let id = validation::parse_id(raw_id, PRODUCT_ID_REQUIRED)?;

        match self.products.delete_product(id, seller_id)? {
            DeleteOutcome::Deleted { pictures } => {
                self.discard(&pictures);
                info!("Product {} deleted by user {}", id, seller_id);
                Ok(())
            }
            DeleteOutcome::NotFound => Err(ApiError::not_found(PRODUCT_NOT_FOUND)),
            DeleteOutcome::NotOwner => {
                warn!("User {} tried to delete product {} they do not sell", seller_id, id);
                Err(ApiError::Forbidden(NOT_THE_SELLER.into()))
            }
        }
    }

    /// Builds the callback the repository runs inside its transaction.
    /// Every file written is recorded in `stored` so a rollback can undo it.
    fn attacher<'a>(
        &'a self,
        pictures: &'a [Picture],
        stored: &'a mut Vec<String>,
    ) -> impl FnMut(i64) -> anyhow::Result<Vec<NewPicture>> + 'a {
        move |_product_id| {
            let mut attached = Vec::with_capacity(pictures.len());
            for picture in pictures {
                let image = self.images.store(picture)?;
                stored.push(image.name.clone());
                attached.push(NewPicture {
                    name: image.name,
                    url: image.url,
                });
            }
            Ok(attached)
        }
    }

    /// Best-effort removal of image files no row points at anymore.
    fn discard(&self, names: &[String]) {
        for name in names {
            if let Err(e) = self.images.remove(name) {
                warn!("Failed to remove image {}: {}", name, e);
            }
        }
    }
}
