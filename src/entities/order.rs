//! Order aggregate and its status state machine
//!
//! ```text
//! pending ──▶ processing ──▶ shipped ──▶ delivered
//!    │            │             │
//!    └────────────┴─────────────┴──────▶ cancelled
//! ```
//!
//! `cancelled` is accepted from every state, terminal ones included; that
//! override is applied by [`OrderStatus::can_transition_to`] on top of the
//! table returned by [`OrderStatus::allowed_transitions`].

use super::product::ProductSummary;
use super::{checked_sum, line_total};
use crate::core::entity::Entity;
use crate::core::error::{OrderError, ValidationError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The regular forward transitions out of this state
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    /// Whether a change from `self` to `next` is accepted.
    ///
    /// Same-state is not a transition and returns false; callers treat it
    /// as a no-op before asking.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self == next {
            return false;
        }
        next == OrderStatus::Cancelled || self.allowed_transitions().contains(&next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus {
                value: s.to_string(),
            })
    }
}

/// Immutable order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn subtotal(&self) -> Result<Decimal, ValidationError> {
        line_total(self.unit_price, self.quantity)
    }
}

/// A placed order. Items and total are fixed at creation; only `status`
/// (and `updated_at`) change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub buyer: Uuid,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending order; the total is computed here once
    pub fn new(buyer: Uuid, items: Vec<OrderItem>) -> Result<Self, ValidationError> {
        let mut total = Decimal::ZERO;
        for item in &items {
            total = checked_sum(total, item.subtotal()?)?;
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            buyer,
            items,
            total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|item| item.product).collect()
    }

    pub fn contains_product(&self, product_id: &Uuid) -> bool {
        self.items.iter().any(|item| &item.product == product_id)
    }

    /// Move to `next`.
    ///
    /// Returns `Ok(None)` when the order already has that status, and
    /// `Ok(Some(previous))` when the status changed.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<Option<OrderStatus>, OrderError> {
        let current = self.status;
        if current == next {
            return Ok(None);
        }
        if !current.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(Some(current))
    }
}

impl Entity for Order {
    fn resource_name() -> &'static str {
        "orders"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Order line with its product populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: Uuid,
    pub product: Option<ProductSummary>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Order as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub buyer: Uuid,
    pub items: Vec<OrderItemView>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn populate(order: &Order, lookup: impl Fn(&Uuid) -> Option<ProductSummary>) -> Self {
        Self {
            id: order.id,
            buyer: order.buyer,
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    product_id: item.product,
                    product: lookup(&item.product),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    // every line was checked by Order::new
                    subtotal: item.subtotal().unwrap_or(Decimal::MAX),
                })
                .collect(),
            total: order.total,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
