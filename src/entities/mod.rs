//! Domain aggregates: products, carts, orders and order comments

pub mod cart;
pub mod comment;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem, CartItemView, CartView};
pub use comment::OrderComment;
pub use order::{Order, OrderItem, OrderItemView, OrderStatus, OrderView};
pub use product::{Product, ProductSummary};

use crate::core::error::ValidationError;
use rust_decimal::Decimal;

/// `unit_price × quantity`, refusing amounts a `Decimal` cannot hold
pub(crate) fn line_total(unit_price: Decimal, quantity: u32) -> Result<Decimal, ValidationError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(quantity_too_large)
}

/// Add two money amounts without overflowing
pub(crate) fn checked_sum(total: Decimal, amount: Decimal) -> Result<Decimal, ValidationError> {
    total.checked_add(amount).ok_or_else(quantity_too_large)
}

pub(crate) fn quantity_too_large() -> ValidationError {
    ValidationError::FieldError {
        field: "quantity".to_string(),
        message: "is too large".to_string(),
    }
}
