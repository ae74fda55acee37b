//! Cart aggregate: a buyer's pending, single-seller collection of lines
//!
//! The derived fields (`subtotal`, `total_price`, `total_items`) are always
//! recomputed by [`Cart::recalculate`] after a mutation, so a stored cart
//! never carries stale totals. Amounts that overflow a `Decimal` are
//! rejected and leave the cart as it was.

use super::product::{Product, ProductSummary};
use super::{checked_sum, line_total, quantity_too_large};
use crate::core::entity::Entity;
use crate::core::error::ValidationError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cart line with the price captured when it entered the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl CartItem {
    pub fn new(product: &Product, quantity: u32) -> Result<Self, ValidationError> {
        Ok(Self {
            product: product.id,
            quantity,
            unit_price: product.price,
            subtotal: line_total(product.price, quantity)?,
        })
    }

    fn recalculate(&mut self) -> Result<(), ValidationError> {
        self.subtotal = line_total(self.unit_price, self.quantity)?;
        Ok(())
    }
}

/// A buyer's cart. At most one exists per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub owner: Uuid,
    pub items: Vec<CartItem>,
    pub total_price: Decimal,
    pub total_items: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart; it only gets persisted once it holds a line
    pub fn new(owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            items: Vec::new(),
            total_price: Decimal::ZERO,
            total_items: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|item| item.product).collect()
    }

    /// Add `quantity` of `product`.
    ///
    /// An existing line accumulates the quantity and takes the product's
    /// current price; otherwise a new line is appended.
    pub fn add_product(&mut self, product: &Product, quantity: u32) -> Result<(), ValidationError> {
        let mut staged = self.clone();
        match staged.items.iter_mut().find(|item| item.product == product.id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(quantity_too_large)?;
                item.unit_price = product.price;
            }
            None => staged.items.push(CartItem::new(product, quantity)?),
        }
        staged.recalculate()?;
        *self = staged;
        Ok(())
    }

    /// Replace the quantity of an existing line. Returns false when the
    /// product has no line in this cart.
    pub fn set_quantity(&mut self, product_id: &Uuid, quantity: u32) -> Result<bool, ValidationError> {
        let mut staged = self.clone();
        let Some(item) = staged.items.iter_mut().find(|item| &item.product == product_id) else {
            return Ok(false);
        };
        item.quantity = quantity;
        staged.recalculate()?;
        *self = staged;
        Ok(true)
    }

    /// Drop the line for `product_id`. Returns false when nothing was removed.
    pub fn remove_product(&mut self, product_id: &Uuid) -> Result<bool, ValidationError> {
        let mut staged = self.clone();
        staged.items.retain(|item| &item.product != product_id);
        if staged.items.len() == self.items.len() {
            return Ok(false);
        }
        staged.recalculate()?;
        *self = staged;
        Ok(true)
    }

    /// Recompute every derived field from the lines
    pub fn recalculate(&mut self) -> Result<(), ValidationError> {
        let mut total_price = Decimal::ZERO;
        let mut total_items = 0u64;
        for item in &mut self.items {
            item.recalculate()?;
            total_price = checked_sum(total_price, item.subtotal)?;
            total_items = total_items
                .checked_add(u64::from(item.quantity))
                .ok_or_else(quantity_too_large)?;
        }
        self.total_price = total_price;
        self.total_items = total_items;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Entity for Cart {
    fn resource_name() -> &'static str {
        "carts"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Cart line with its product populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: Uuid,
    /// `None` when the product has been removed from the catalog since
    pub product: Option<ProductSummary>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Cart as returned to clients. A buyer without a cart gets
/// [`CartView::empty`], which serializes to
/// `{"items": [], "totalPrice": 0, "totalItems": 0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Uuid>,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
    pub total_items: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartView {
    pub fn empty() -> Self {
        Self {
            id: None,
            owner: None,
            items: Vec::new(),
            total_price: Decimal::ZERO,
            total_items: 0,
            updated_at: None,
        }
    }

    /// Populate `cart` with the given product lookup
    pub fn populate(cart: &Cart, lookup: impl Fn(&Uuid) -> Option<ProductSummary>) -> Self {
        Self {
            id: Some(cart.id),
            owner: Some(cart.owner),
            items: cart
                .items
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product,
                    product: lookup(&item.product),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    subtotal: item.subtotal,
                })
                .collect(),
            total_price: cart.total_price,
            total_items: cart.total_items,
            updated_at: Some(cart.updated_at),
        }
    }
}
