//! # Marketplace
//!
//! Cart and order lifecycle core of a multi-seller marketplace, exposed as a
//! REST API.
//!
//! ## Features
//!
//! - **Single-seller carts**: one pending cart per buyer, restricted to one seller
//! - **Checkout**: from the cart or from explicit lines, with price snapshots
//! - **Order state machine**: `pending → processing → shipped → delivered`,
//!   with `cancelled` reachable from any state
//! - **Seller and admin views**: orders filtered by product ownership and status
//! - **Notifications**: order events streamed to sellers over Server-Sent Events
//! - **Pluggable storage**: in-memory, or MongoDB behind `mongodb_backend`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use marketplace::prelude::*;
//!
//! let app = ServerBuilder::new()
//!     .with_store(InMemoryStore::new())
//!     .with_auth_provider(JwtAuthProvider::new("secret"))
//!     .build()?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod services;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthPolicy, AuthProvider, JwtAuthProvider, Principal, Role, StaticTokenProvider},
        entity::Entity,
        error::{
            CartError, ConfigError, ErrorKind, MarketError, MarketResult, OrderError,
            RequestError, StorageError, ValidationError,
        },
        events::{EventBus, EventEnvelope, OrderEvent},
        repository::{
            CartRepository, OrderCommentRepository, OrderRepository, ProductRepository,
            Repositories,
        },
    };

    // === Domain ===
    pub use crate::entities::{
        Cart, CartItem, CartItemView, CartView, Order, OrderComment, OrderItem, OrderItemView,
        OrderStatus, OrderView, Product, ProductSummary,
    };

    // === Services ===
    pub use crate::services::{CartRemoval, CartService, OrderLine, OrderService};

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::MarketplaceConfig;

    // === Server ===
    pub use crate::server::{RestExposure, ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
