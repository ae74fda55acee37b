//! `/orders` handlers (buyer side)

use super::required_id;
use crate::core::error::MarketResult;
use crate::core::extractors::{Authenticated, Validated, parse_id, parse_optional_body};
use crate::entities::{OrderComment, OrderView};
use crate::server::host::ServerHost;
use crate::services::OrderLine;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Explicit lines; when empty the caller's cart is checked out
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Option<String>,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[serde(default)]
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub comment: String,
}

/// POST /orders
pub async fn create_order(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    body: Bytes,
) -> MarketResult<(StatusCode, Json<OrderView>)> {
    let body: CreateOrderRequest = parse_optional_body(&body)?;

    let lines = body
        .items
        .iter()
        .map(|item| {
            Ok(OrderLine::new(
                required_id("productId", item.product_id.as_deref())?,
                item.quantity.unwrap_or(1),
            ))
        })
        .collect::<MarketResult<Vec<_>>>()?;

    let order = host.orders.create_order(&principal, lines).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders
pub async fn list_orders(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
) -> MarketResult<Json<Vec<OrderView>>> {
    Ok(Json(host.orders.list_buyer_orders(&principal).await?))
}

/// GET /orders/{id}
pub async fn get_order(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> MarketResult<Json<OrderView>> {
    let order_id = parse_id(&id)?;
    Ok(Json(host.orders.get_order(&principal, order_id).await?))
}

/// POST /orders/{id}/comments
pub async fn add_comment(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
    Validated(body): Validated<CommentRequest>,
) -> MarketResult<(StatusCode, Json<OrderComment>)> {
    let order_id = parse_id(&id)?;
    let comment = host
        .orders
        .add_order_comment(&principal, order_id, &body.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /orders/{id}/comments
pub async fn list_comments(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> MarketResult<Json<Vec<OrderComment>>> {
    let order_id = parse_id(&id)?;
    Ok(Json(
        host.orders.list_order_comments(&principal, order_id).await?,
    ))
}
