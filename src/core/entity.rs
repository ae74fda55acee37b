//! Entity trait shared by every stored aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Base trait for all persisted aggregates.
///
/// Storage backends are generic over this trait: the in-memory backend keys
/// its tables by [`Entity::id`], the MongoDB backend uses
/// [`Entity::resource_name`] as the collection name.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The plural resource name (e.g., "orders", "carts")
    fn resource_name() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;
}
