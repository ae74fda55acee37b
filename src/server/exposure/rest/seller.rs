//! `/seller` and `/admin` handlers
//!
//! Every route here checks the caller's role before touching a service.

use super::StatusQuery;
use crate::core::auth::AuthPolicy;
use crate::core::error::{MarketError, MarketResult, ValidationError};
use crate::core::extractors::{Authenticated, Validated, parse_id};
use crate::entities::OrderView;
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, message = "status is required"))]
    #[serde(default)]
    pub status: String,
}

/// GET /seller/orders?status=
pub async fn list_orders(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Query(query): Query<StatusQuery>,
) -> MarketResult<Json<Vec<OrderView>>> {
    principal.require(&AuthPolicy::seller_or_admin())?;
    Ok(Json(
        host.orders
            .list_seller_orders(&principal, query.status.as_deref())
            .await?,
    ))
}

/// PUT /seller/orders/{id}/status
pub async fn update_status(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
    Validated(body): Validated<UpdateStatusRequest>,
) -> MarketResult<Json<OrderView>> {
    principal.require(&AuthPolicy::seller_or_admin())?;
    let order_id = parse_id(&id)?;
    if body.status.trim().is_empty() {
        return Err(MarketError::Validation(ValidationError::MissingArgument {
            argument: "status".to_string(),
        }));
    }
    Ok(Json(
        host.orders
            .update_order_status(&principal, order_id, &body.status)
            .await?,
    ))
}

/// GET /admin/orders?status=
pub async fn list_all_orders(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
    Query(query): Query<StatusQuery>,
) -> MarketResult<Json<Vec<OrderView>>> {
    Ok(Json(
        host.orders
            .list_all_orders(&principal, query.status.as_deref())
            .await?,
    ))
}
