//! Product catalog entry, read by the cart and order services

use crate::core::entity::Entity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A listed product. The core never mutates products; it only reads the
/// current price and the owning seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub seller: Uuid,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(title: impl Into<String>, price: Decimal, seller: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            price,
            seller,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The populated shape attached to cart and order lines
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            title: self.title.clone(),
            price: self.price,
            seller: self.seller,
        }
    }
}

impl Entity for Product {
    fn resource_name() -> &'static str {
        "products"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// `{id, title, price, seller}` projection of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub seller: Uuid,
}
