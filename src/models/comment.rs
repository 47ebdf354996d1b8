use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Orderable;

/// A discussion comment attached to a feature.
///
/// Comments are ordered within their feature rather than the whole project,
/// so pinning a comment to the top of one thread leaves others untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub feature_id: Uuid,
    /// Identity of the user who wrote the comment.
    pub author: String,
    pub body: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a comment. The author is taken from the caller identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCommentInput {
    pub body: String,
    pub order: Option<i64>,
}

impl Orderable for Comment {
    fn order_id(&self) -> String {
        self.id.to_string()
    }

    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}
