//! Internal event system for order notifications
//!
//! The EventBus uses `tokio::sync::broadcast` to decouple order writes from
//! the sellers listening for them.
//!
//! ```text
//! OrderService ──▶ EventBus::publish() ──▶ broadcast channel ──▶ SSE subscribers
//! ```

use crate::core::auth::Principal;
use crate::entities::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something happened to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderEvent {
    /// An order was placed
    Created {
        order_id: Uuid,
        buyer: Uuid,
        sellers: Vec<Uuid>,
        total: Decimal,
    },
    /// An order moved to another status
    StatusChanged {
        order_id: Uuid,
        buyer: Uuid,
        sellers: Vec<Uuid>,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::Created { order_id, .. } | OrderEvent::StatusChanged { order_id, .. } => {
                *order_id
            }
        }
    }

    pub fn sellers(&self) -> &[Uuid] {
        match self {
            OrderEvent::Created { sellers, .. } | OrderEvent::StatusChanged { sellers, .. } => {
                sellers
            }
        }
    }

    /// Get the action name (created, status_changed)
    pub fn action(&self) -> &str {
        match self {
            OrderEvent::Created { .. } => "created",
            OrderEvent::StatusChanged { .. } => "status_changed",
        }
    }

    /// Whether `principal` should be notified of this event
    pub fn concerns(&self, principal: &Principal) -> bool {
        principal.is_admin() || self.sellers().contains(&principal.id)
    }
}

/// Envelope wrapping an order event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    pub event: OrderEvent,
}

impl EventEnvelope {
    pub fn new(event: OrderEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never blocks and never fails. Returns the number of receivers that
    /// will receive the event.
    pub fn publish(&self, event: OrderEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() only fails when nobody is listening
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
