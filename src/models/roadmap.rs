use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Orderable;

/// An entry on a project's roadmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    /// Free-form grouping label (e.g. "Onboarding", "Q3 Performance").
    pub theme: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a roadmap item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoadmapItemInput {
    pub title: String,
    pub theme: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub order: Option<i64>,
}

impl Orderable for RoadmapItem {
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
