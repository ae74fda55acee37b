//! Server host: the state shared by every HTTP handler
//!
//! The host is transport-agnostic. It owns the services, the auth provider
//! and the event bus; [`RestExposure`](super::exposure::RestExposure) turns it
//! into an axum `Router`.

use crate::core::auth::AuthProvider;
use crate::core::events::EventBus;
use crate::core::repository::Repositories;
use crate::services::{CartService, OrderService};
use axum::extract::FromRef;
use std::sync::Arc;

/// Host context containing all service state
///
/// Cheap to clone; it is used directly as the axum router state.
#[derive(Clone)]
pub struct ServerHost {
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub auth: Arc<dyn AuthProvider>,
    pub event_bus: EventBus,
}

impl ServerHost {
    /// Wire the services onto `repositories`
    pub fn new(
        repositories: &Repositories,
        auth: Arc<dyn AuthProvider>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            carts: Arc::new(CartService::new(repositories)),
            orders: Arc::new(OrderService::new(repositories, event_bus.clone())),
            auth,
            event_bus,
        }
    }
}

impl FromRef<ServerHost> for Arc<dyn AuthProvider> {
    fn from_ref(host: &ServerHost) -> Self {
        host.auth.clone()
    }
}
