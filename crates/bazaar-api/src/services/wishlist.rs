use std::sync::Arc;

use tracing::info;

use bazaar_db::{ProductRepository, WishlistRepository};
use bazaar_types::models::Wishlist;

use crate::convert;
use crate::error::ApiError;
use crate::validation::parse_id;

// Product ids are never zero or negative, so those fail validation here
// rather than reaching storage and coming back as not found.
const PRODUCT_ID_REQUIRED: &str = "Valid product ID is required";
const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Per-user saved products. Every operation is scoped to the acting user.
#[derive(Clone)]
pub struct WishlistService {
    wishlists: Arc<dyn WishlistRepository>,
    products: Arc<dyn ProductRepository>,
}

impl WishlistService {
    pub fn new(wishlists: Arc<dyn WishlistRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self {
            wishlists,
            products,
        }
    }

    pub fn check(&self, raw_product_id: &str, user_id: i64) -> Result<bool, ApiError> {
        let product_id = parse_id(raw_product_id, PRODUCT_ID_REQUIRED)?;
        self.require_product(product_id)?;
        Ok(self.wishlists.find_wishlist(user_id, product_id)?.is_some())
    }

    pub fn list(&self, user_id: i64) -> Result<Vec<Wishlist>, ApiError> {
        let rows = self.wishlists.list_wishlists(user_id)?;
        Ok(rows.into_iter().map(convert::wishlist).collect())
    }

    /// Duplicates are caught by the storage layer's uniqueness constraint,
    /// so two concurrent adds cannot both succeed.
    pub fn add(&self, raw_product_id: &str, user_id: i64) -> Result<Wishlist, ApiError> {
        let product_id = parse_id(raw_product_id, PRODUCT_ID_REQUIRED)?;
        self.require_product(product_id)?;

        let row = self
            .wishlists
            .insert_wishlist(user_id, product_id)?
            .ok_or_else(|| ApiError::AlreadyExists("Product is already in wishlist".into()))?;

        info!("User {} added product {} to wishlist", user_id, product_id);
        Ok(convert::wishlist(row))
    }

    pub fn remove(&self, raw_product_id: &str, user_id: i64) -> Result<(), ApiError> {
        let product_id = parse_id(raw_product_id, PRODUCT_ID_REQUIRED)?;
        if !self.wishlists.delete_wishlist(user_id, product_id)? {
            return Err(ApiError::not_found("Wishlist not found"));
        }
        Ok(())
    }

    fn require_product(&self, product_id: i64) -> Result<(), ApiError> {
        if self.products.product_exists(product_id)? {
            Ok(())
        } else {
            Err(ApiError::not_found(PRODUCT_NOT_FOUND))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::PanickingRepo;
    use bazaar_db::models::{NewPicture, NewProduct};
    use bazaar_db::{Database, UserRepository};

    fn fixture() -> (WishlistService, i64, i64) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let seller = db.create_user("seller@example.com", "h", "Seller").unwrap().unwrap();
        let buyer = db.create_user("buyer@example.com", "h", "Buyer").unwrap().unwrap();
        let product = NewProduct {
            name: "Bike",
            price: 900,
            category: "Vehicle",
            description: "two wheels",
            seller_id: seller,
        };
        let mut attach = |_id: i64| -> anyhow::Result<Vec<NewPicture>> { Ok(Vec::new()) };
        let product = db.create_product(&product, &mut attach).unwrap().unwrap();
        (WishlistService::new(db.clone(), db), buyer, product.id)
    }

    #[test]
    fn add_twice_conflicts_and_remove_clears_the_flag() {
        let (service, buyer, product) = fixture();
        let id = product.to_string();

        assert!(!service.check(&id, buyer).unwrap());

        let wishlist = service.add(&id, buyer).unwrap();
        assert_eq!(wishlist.product_id, product);
        assert_eq!(wishlist.user_id, buyer);
        assert!(service.check(&id, buyer).unwrap());

        assert!(matches!(service.add(&id, buyer), Err(ApiError::AlreadyExists(_))));

        service.remove(&id, buyer).unwrap();
        assert!(!service.check(&id, buyer).unwrap());
        assert!(matches!(service.remove(&id, buyer), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn unknown_products_are_not_found() {
        let (service, buyer, _) = fixture();
        assert!(matches!(service.check("9999", buyer), Err(ApiError::NotFound(_))));
        assert!(matches!(service.add("9999", buyer), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn lists_are_scoped_to_the_user() {
        let (service, buyer, product) = fixture();
        service.add(&product.to_string(), buyer).unwrap();

        assert_eq!(service.list(buyer).unwrap().len(), 1);
        assert!(service.list(buyer + 100).unwrap().is_empty());
    }

    #[test]
    fn malformed_ids_never_reach_storage() {
        let service = WishlistService::new(Arc::new(PanickingRepo), Arc::new(PanickingRepo));
        for raw in ["abc", "1.0", "-2", "0", ""] {
            assert!(matches!(service.check(raw, 1), Err(ApiError::Validation(_))));
            assert!(matches!(service.add(raw, 1), Err(ApiError::Validation(_))));
            assert!(matches!(service.remove(raw, 1), Err(ApiError::Validation(_))));
        }
    }
}
