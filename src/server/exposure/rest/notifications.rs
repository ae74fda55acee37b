//! Server-Sent Events stream of order notifications for sellers

use crate::core::auth::AuthPolicy;
use crate::core::error::MarketResult;
use crate::core::extractors::Authenticated;
use crate::server::host::ServerHost;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// GET /seller/notifications
///
/// Streams every order event involving the caller's products (all events
/// for admins). Each SSE message is named after the event action and
/// carries the JSON envelope.
pub async fn stream(
    State(host): State<ServerHost>,
    Authenticated(principal): Authenticated,
) -> MarketResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    principal.require(&AuthPolicy::seller_or_admin())?;
    tracing::debug!(user = %principal.id, "notification stream opened");

    let events = BroadcastStream::new(host.event_bus.subscribe())
        .filter_map(move |received| match received {
            Ok(envelope) if envelope.event.concerns(&principal) => Some(envelope),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(user = %principal.id, skipped, "notification stream lagged");
                None
            }
        })
        .map(|envelope| {
            Event::default()
                .id(envelope.id.to_string())
                .event(envelope.event.action())
                .json_data(&envelope)
        });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
