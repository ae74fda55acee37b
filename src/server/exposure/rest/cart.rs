//! `/cart` handlers

use super::{MessageResponse, required_id};
use crate::core::error::MarketResult;
use crate::core::extractors::{Authenticated, Validated, parse_id};
use crate::entities::CartView;
use crate::server::host::ServerHost;
use crate::services::CartRemoval;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<String>,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(
        required(message = "quantity is required"),
        range(min = 1, message = "must be a positive integer")
    )]
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AddedToCart {
    pub message: &'static str,
    pub cart: CartView,
}

/// POST /cart
pub async fn add_item(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Validated(body): Validated<AddToCartRequest>,
) -> MarketResult<Json<AddedToCart>> {
    let product_id = required_id("productId", body.product_id.as_deref())?;
    let cart = host
        .carts
        .add_item(&principal, product_id, body.quantity.unwrap_or(1))
        .await?;

    Ok(Json(AddedToCart {
        message: "Added to cart",
        cart,
    }))
}

/// GET /cart
pub async fn get_cart(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
) -> MarketResult<Json<CartView>> {
    Ok(Json(host.carts.get_cart(&principal).await?))
}

/// PUT /cart/{product_id}
pub async fn update_item(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Path(product_id): Path<String>,
    Validated(body): Validated<UpdateQuantityRequest>,
) -> MarketResult<Json<CartView>> {
    let product_id = parse_id(&product_id)?;
    let quantity = body.quantity.unwrap_or_default();
    Ok(Json(
        host.carts
            .update_item_quantity(&principal, product_id, quantity)
            .await?,
    ))
}

/// DELETE /cart/{product_id}
pub async fn remove_item(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Path(product_id): Path<String>,
) -> MarketResult<Response> {
    let product_id = parse_id(&product_id)?;
    let response = match host.carts.remove_item(&principal, product_id).await? {
        CartRemoval::Updated(cart) => Json(cart).into_response(),
        CartRemoval::Cleared => Json(MessageResponse::new("Cart cleared")).into_response(),
    };
    Ok(response)
}

/// DELETE /cart
pub async fn clear_cart(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
) -> MarketResult<Json<MessageResponse>> {
    host.carts.clear_cart(&principal).await?;
    Ok(Json(MessageResponse::new("Cart cleared")))
}
