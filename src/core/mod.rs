//! Core module containing the fundamental traits and types of the service

pub mod auth;
pub mod entity;
pub mod error;
pub mod events;
pub mod extractors;
pub mod repository;

pub use auth::{AuthPolicy, AuthProvider, JwtAuthProvider, Principal, Role, StaticTokenProvider};
pub use entity::Entity;
pub use error::{ErrorKind, MarketError, MarketResult};
pub use events::{EventBus, EventEnvelope, OrderEvent};
pub use repository::{
    CartRepository, OrderCommentRepository, OrderRepository, ProductRepository, Repositories,
};
