//! Cart and order services
//!
//! Services are stateless: they hold the repositories they need and are
//! shared behind `Arc` by the HTTP layer. Each public operation takes the
//! verified [`Principal`](crate::core::auth::Principal) of the caller and
//! returns a populated view.

pub mod cart;
pub mod order;

pub use cart::{CartRemoval, CartService};
pub use order::{OrderLine, OrderService};

use crate::core::error::{MarketError, MarketResult};
use crate::core::repository::ProductRepository;
use crate::entities::Product;
use std::collections::HashMap;
use uuid::Uuid;

/// Load the products behind `ids`, keyed by ID. Unknown IDs are absent.
pub(crate) async fn load_products(
    products: &dyn ProductRepository,
    ids: &[Uuid],
) -> MarketResult<HashMap<Uuid, Product>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();

    Ok(products
        .find_by_ids(&unique)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect())
}

/// Check a requested quantity and narrow it to the stored type
pub(crate) fn positive_quantity(quantity: i64) -> MarketResult<u32> {
    if quantity <= 0 {
        return Err(MarketError::invalid_field(
            "quantity",
            "must be a positive integer",
        ));
    }
    u32::try_from(quantity).map_err(|_| MarketError::invalid_field("quantity", "is too large"))
}
