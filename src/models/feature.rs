use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Orderable;

/// A capability of the product being planned.
///
/// Features are ordered within their project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub details: Option<String>,
    pub state: FeatureState,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The lifecycle state of a feature.
///
/// - `Proposed`: Initial idea, not yet fully specified
/// - `Specified`: Requirements defined, ready for implementation
/// - `Implemented`: Built and shipped
/// - `Deprecated`: No longer active, kept for reference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    Proposed,
    Specified,
    Implemented,
    Deprecated,
}

impl FeatureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Specified => "specified",
            Self::Implemented => "implemented",
            Self::Deprecated => "deprecated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "proposed" => Some(Self::Proposed),
            "specified" => Some(Self::Specified),
            "implemented" => Some(Self::Implemented),
            "deprecated" => Some(Self::Deprecated),
            _ => None,
        }
    }
}

/// Input for creating a new feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFeatureInput {
    pub title: String,
    pub details: Option<String>,
    /// Initial state. Defaults to `Proposed` if not specified.
    pub state: Option<FeatureState>,
    /// Position in the project. Defaults to the end of the list.
    pub order: Option<i64>,
}

impl Orderable for Feature {
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
