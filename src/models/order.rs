use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An entity that participates in a user-controlled sequence.
///
/// Implemented by every orderable model so the client helpers can renumber
/// and swap items without knowing their concrete type.
pub trait Orderable {
    /// Identifier sent in a reorder batch.
    fn order_id(&self) -> String;
    fn order(&self) -> i64;
    fn set_order(&mut self, order: i64);
}

/// The orderable resource kinds, one per table and per `/order` endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Features,
    Comments,
    RoadmapItems,
    Sprints,
    Tasks,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Self::Features,
        Self::Comments,
        Self::RoadmapItems,
        Self::Sprints,
        Self::Tasks,
    ];

    /// URL path segment, e.g. `roadmap-items`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Features => "features",
            Self::Comments => "comments",
            Self::RoadmapItems => "roadmap-items",
            Self::Sprints => "sprints",
            Self::Tasks => "tasks",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Features => "features",
            Self::Comments => "comments",
            Self::RoadmapItems => "roadmap_items",
            Self::Sprints => "sprints",
            Self::Tasks => "tasks",
        }
    }

    /// Human-readable singular name used in messages.
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Features => "feature",
            Self::Comments => "comment",
            Self::RoadmapItems => "roadmap item",
            Self::Sprints => "sprint",
            Self::Tasks => "task",
        }
    }

    /// Path of the list endpoint for a scoping set.
    ///
    /// Comments are scoped to a feature; everything else to a project.
    pub fn list_path(&self, scope_id: Uuid) -> String {
        match self {
            Self::Comments => format!("/features/{}/comments", scope_id),
            _ => format!("/projects/{}/{}", scope_id, self.as_str()),
        }
    }

    pub fn order_path(&self) -> String {
        format!("/{}/order", self.as_str())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// Largest order value a client may set. New items are appended at
/// `MAX(order) + 1`, which must stay within SQLite's integer range.
pub const MAX_ORDER: i64 = i32::MAX as i64;

/// One `(id, order)` pair of a reorder batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderEntry {
    pub id: String,
    pub order: i64,
}

impl OrderEntry {
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }
}

/// Body of `PATCH /api/{resource}/order`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReorderRequest {
    pub items: Vec<OrderEntry>,
}

/// Success body of the order endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderResponse {
    pub message: String,
}

/// A field-level problem found while validating a request body.
///
/// `path` points into the body, e.g. `items[2].order`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The common shape of any orderable item, as returned by the list endpoints.
///
/// Used where the concrete resource type does not matter (the CLI). The label
/// is whichever of `title`, `name` or `body` the resource carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: Uuid,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ItemSummary {
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .or(self.body.as_deref())
            .unwrap_or("")
    }
}

impl Orderable for ItemSummary {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_round_trips_through_path_segment() {
        for resource in Resource::ALL {
            assert_eq!(Resource::from_str(resource.as_str()), Some(resource));
        }
        assert_eq!(Resource::from_str("files"), None);
    }

    #[test]
    fn resource_serializes_as_kebab_case() {
        let json = serde_json::to_string(&Resource::RoadmapItems).unwrap();
        assert_eq!(json, "\"roadmap-items\"");
    }

    #[test]
    fn comments_are_listed_under_their_feature() {
        let id = Uuid::nil();
        assert_eq!(
            Resource::Comments.list_path(id),
            format!("/features/{}/comments", id)
        );
        assert_eq!(
            Resource::Sprints.list_path(id),
            format!("/projects/{}/sprints", id)
        );
    }

    #[test]
    fn summary_label_prefers_title_then_name_then_body() {
        let summary: ItemSummary = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "order": 3,
            "name": "Sprint 4",
            "goal": "ignored"
        }))
        .unwrap();
        assert_eq!(summary.label(), "Sprint 4");
        assert_eq!(summary.order, 3);
    }
}
