//! Axum extractors for the REST handlers
//!
//! - [`Authenticated`] resolves the bearer token into a [`Principal`]
//! - [`Validated`] deserializes a JSON body and runs its `validator` rules
//!
//! Both reject with a [`MarketError`], so every failure renders the same
//! `{ "error", "code" }` body as the services do.

use axum::Json;
use axum::extract::{FromRef, FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::auth::{AuthProvider, Principal};
use crate::core::error::{MarketError, MarketResult, RequestError};

/// The authenticated caller of a request
///
/// Requires an `Authorization: Bearer <token>` header accepted by the
/// state's [`AuthProvider`]; anything else is a 401.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    Arc<dyn AuthProvider>: FromRef<S>,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| MarketError::unauthorized("no token"))?
            .to_str()
            .map_err(|_| MarketError::unauthorized("malformed authorization header"))?;

        let token = bearer_token(header)?;
        let provider = Arc::<dyn AuthProvider>::from_ref(state);
        let principal = provider.authenticate(token).await.inspect_err(|e| {
            tracing::debug!(error = %e, "token rejected");
        })?;

        Ok(Authenticated(principal))
    }
}

/// Strip the `Bearer` scheme from an authorization header value
pub fn bearer_token(header: &str) -> MarketResult<&str> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| MarketError::unauthorized("expected a bearer token"))?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(MarketError::unauthorized("expected a bearer token"));
    }
    Ok(token.trim())
}

/// JSON body that passed its `validator` rules
///
/// ```rust,ignore
/// async fn add(Validated(body): Validated<AddToCartRequest>) -> ... {
///     // body.quantity is already known to be >= 1
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = MarketError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            MarketError::Request(RequestError::InvalidBody {
                message: rejection.body_text(),
            })
        })?;

        payload.validate().map_err(first_violation)?;

        Ok(Validated(payload))
    }
}

/// Deserialize and validate a body that may be absent; an empty body yields
/// `T::default()`
pub fn parse_optional_body<T>(body: &[u8]) -> MarketResult<T>
where
    T: DeserializeOwned + Validate + Default,
{
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        T::default()
    } else {
        serde_json::from_slice(body)?
    };
    payload.validate().map_err(first_violation)?;
    Ok(payload)
}

fn first_violation(errors: validator::ValidationErrors) -> MarketError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    match fields.first() {
        Some((field, violations)) => {
            let message = violations
                .first()
                .map(|v| match &v.message {
                    Some(message) => message.to_string(),
                    None => v.code.to_string(),
                })
                .unwrap_or_else(|| "invalid value".to_string());
            MarketError::invalid_field(field.to_string(), message)
        }
        None => MarketError::invalid_field("body", errors.to_string()),
    }
}

/// Parse an id taken from the path or the body
pub fn parse_id(value: &str) -> MarketResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        MarketError::Request(RequestError::InvalidId {
            value: value.to_string(),
        })
    })
}
