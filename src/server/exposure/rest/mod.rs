//! REST API exposure
//!
//! Consumes a [`ServerHost`] and produces an axum `Router`:
//!
//! | Route                              | Handler                      |
//! |------------------------------------|------------------------------|
//! | `POST/GET/DELETE /cart`            | [`cart`]                     |
//! | `PUT/DELETE /cart/{product_id}`    | [`cart`]                     |
//! | `POST/GET /orders`, `GET /orders/{id}` | [`orders`]               |
//! | `POST/GET /orders/{id}/comments`   | [`orders`]                   |
//! | `GET /seller/orders`, `PUT /seller/orders/{id}/status` | [`seller`] |
//! | `GET /admin/orders`                | [`seller`]                   |
//! | `GET /seller/notifications`        | [`notifications`] (SSE)      |

pub mod cart;
pub mod notifications;
pub mod orders;
pub mod seller;

use super::super::host::ServerHost;
use crate::core::error::{MarketError, MarketResult, ValidationError};
use crate::core::extractors::parse_id;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// `custom_routes` are merged in as-is, after the marketplace routes.
    pub fn build_router(host: ServerHost, custom_routes: Vec<Router>) -> Router {
        let mut app = Self::health_routes().merge(Self::api_routes(host));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    }

    fn api_routes(host: ServerHost) -> Router {
        Router::new()
            .route(
                "/cart",
                get(cart::get_cart)
                    .post(cart::add_item)
                    .delete(cart::clear_cart),
            )
            .route(
                "/cart/{product_id}",
                put(cart::update_item).delete(cart::remove_item),
            )
            .route(
                "/orders",
                get(orders::list_orders).post(orders::create_order),
            )
            .route("/orders/{id}", get(orders::get_order))
            .route(
                "/orders/{id}/comments",
                get(orders::list_comments).post(orders::add_comment),
            )
            .route("/seller/orders", get(seller::list_orders))
            .route("/seller/orders/{id}/status", put(seller::update_status))
            .route("/seller/notifications", get(notifications::stream))
            .route("/admin/orders", get(seller::list_all_orders))
            .with_state(host)
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "marketplace"
        }))
    }
}

/// `{ "message": ... }` body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// `?status=` filter
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// An id that must be present in the body
fn required_id(field: &str, value: Option<&str>) -> MarketResult<Uuid> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => parse_id(value),
        _ => Err(MarketError::Validation(ValidationError::MissingArgument {
            argument: field.to_string(),
        })),
    }
}
