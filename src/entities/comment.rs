//! Buyer comments attached to an order

use crate::core::entity::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderComment {
    pub id: Uuid,
    pub order: Uuid,
    pub author: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl OrderComment {
    pub fn new(order: Uuid, author: Uuid, comment: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            author,
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }
}

impl Entity for OrderComment {
    fn resource_name() -> &'static str {
        "order_comments"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
