//! `PATCH /api/{resource}/order` handlers.
//!
//! One thin handler per resource. The body is read through [`JsonBody`],
//! then [`reorder`] validates its shape and applies it as a single
//! transactional batch that also checks the caller's membership of every
//! item's project.

use axum::{extract::State, Json};
use serde_json::Value;

use crate::api::body::JsonBody;
use crate::api::caller::Caller;
use crate::api::error::ApiError;
use crate::api::validation::parse_reorder_body;
use crate::db::{Access, Database};
use crate::models::{ReorderResponse, Resource};

fn reorder(
    db: &Database,
    resource: Resource,
    caller: &Caller,
    body: &Value,
) -> Result<Json<ReorderResponse>, ApiError> {
    let entries = parse_reorder_body(body).map_err(|issues| {
        tracing::warn!("Rejected {} order body with {} issues", resource, issues.len());
        ApiError::Validation(issues)
    })?;

    db.apply_order(resource, &entries, Access::Member(&caller.user_id))
        .map_err(|e| ApiError::from_order(resource, e))?;

    tracing::info!(
        "User {} reordered {} {} items",
        caller.user_id,
        entries.len(),
        resource
    );

    Ok(Json(ReorderResponse {
        message: "Order updated successfully".to_string(),
    }))
}

pub async fn reorder_features(
    State(db): State<Database>,
    caller: Caller,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ReorderResponse>, ApiError> {
    reorder(&db, Resource::Features, &caller, &body)
}

pub async fn reorder_comments(
    State(db): State<Database>,
    caller: Caller,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ReorderResponse>, ApiError> {
    reorder(&db, Resource::Comments, &caller, &body)
}

pub async fn reorder_roadmap_items(
    State(db): State<Database>,
    caller: Caller,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ReorderResponse>, ApiError> {
    reorder(&db, Resource::RoadmapItems, &caller, &body)
}

pub async fn reorder_sprints(
    State(db): State<Database>,
    caller: Caller,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ReorderResponse>, ApiError> {
    reorder(&db, Resource::Sprints, &caller, &body)
}

pub async fn reorder_tasks(
    State(db): State<Database>,
    caller: Caller,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<ReorderResponse>, ApiError> {
    reorder(&db, Resource::Tasks, &caller, &body)
}
