mod order;

pub use order::*;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::body::JsonBody;
use super::caller::Caller;
use super::error::ApiError;
use super::validation::check_order;
use crate::db::Database;
use crate::models::*;

// ============================================================
// Access checks
// ============================================================

/// Resolve the caller's membership of a project.
///
/// 404 if the project does not exist, 403 if the caller is not a member.
fn require_member(
    db: &Database,
    project_id: Uuid,
    caller: &Caller,
) -> Result<ProjectMember, ApiError> {
    db.get_project(project_id)?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    db.get_member(project_id, &caller.user_id)?.ok_or_else(|| {
        tracing::warn!(
            "User {} denied access to project {}",
            caller.user_id,
            project_id
        );
        ApiError::Forbidden("Not a member of this project".to_string())
    })
}

fn require_owner(db: &Database, project_id: Uuid, caller: &Caller) -> Result<(), ApiError> {
    let member = require_member(db, project_id, caller)?;
    if member.role != MemberRole::Owner {
        return Err(ApiError::Forbidden(
            "Only project owners can do this".to_string(),
        ));
    }
    Ok(())
}

fn require_text(path: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid_field(path, "Must not be empty"));
    }
    Ok(())
}

fn require_order(order: Option<i64>) -> Result<(), ApiError> {
    check_order(order).map_err(ApiError::Validation)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(
    State(db): State<Database>,
    caller: Caller,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(db.get_projects_for_user(&caller.user_id)?))
}

pub async fn create_project(
    State(db): State<Database>,
    caller: Caller,
    JsonBody(input): JsonBody<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    require_text("name", &input.name)?;

    let project = db.create_project(input, &caller.user_id)?;
    tracing::info!("User {} created project {}", caller.user_id, project.id);
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    require_member(&db, id, &caller)?;
    db.get_project(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

pub async fn delete_project(
    State(db): State<Database>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_owner(&db, id, &caller)?;
    if db.delete_project(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Project not found".to_string()))
    }
}

// ============================================================
// Members
// ============================================================

pub async fn list_members(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ProjectMember>>, ApiError> {
    require_member(&db, project_id, &caller)?;
    Ok(Json(db.get_members(project_id)?))
}

pub async fn add_member(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    JsonBody(input): JsonBody<AddMemberInput>,
) -> Result<(StatusCode, Json<ProjectMember>), ApiError> {
    require_owner(&db, project_id, &caller)?;
    require_text("user_id", &input.user_id)?;

    let user_id = input.user_id.clone();
    db.add_member(project_id, input)?
        .map(|m| (StatusCode::CREATED, Json(m)))
        .ok_or_else(|| ApiError::Conflict(format!("{} is already a member", user_id)))
}

// ============================================================
// Features
// ============================================================

pub async fn list_features(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Feature>>, ApiError> {
    require_member(&db, project_id, &caller)?;
    Ok(Json(db.get_features_by_project(project_id)?))
}

pub async fn create_feature(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    JsonBody(input): JsonBody<CreateFeatureInput>,
) -> Result<(StatusCode, Json<Feature>), ApiError> {
    require_member(&db, project_id, &caller)?;
    require_text("title", &input.title)?;
    require_order(input.order)?;

    let feature = db.create_feature(project_id, input)?;
    Ok((StatusCode::CREATED, Json(feature)))
}

// ============================================================
// Comments
// ============================================================

fn require_feature(db: &Database, feature_id: Uuid, caller: &Caller) -> Result<Feature, ApiError> {
    let feature = db
        .get_feature(feature_id)?
        .ok_or_else(|| ApiError::NotFound("Feature not found".to_string()))?;
    require_member(db, feature.project_id, caller)?;
    Ok(feature)
}

pub async fn list_comments(
    State(db): State<Database>,
    caller: Caller,
    Path(feature_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    require_feature(&db, feature_id, &caller)?;
    Ok(Json(db.get_comments_by_feature(feature_id)?))
}

pub async fn create_comment(
    State(db): State<Database>,
    caller: Caller,
    Path(feature_id): Path<Uuid>,
    JsonBody(input): JsonBody<CreateCommentInput>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let feature = require_feature(&db, feature_id, &caller)?;
    require_text("body", &input.body)?;
    require_order(input.order)?;

    let comment = db.create_comment(&feature, &caller.user_id, input)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// ============================================================
// Roadmap
// ============================================================

pub async fn list_roadmap_items(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<RoadmapItem>>, ApiError> {
    require_member(&db, project_id, &caller)?;
    Ok(Json(db.get_roadmap_items(project_id)?))
}

pub async fn create_roadmap_item(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    JsonBody(input): JsonBody<CreateRoadmapItemInput>,
) -> Result<(StatusCode, Json<RoadmapItem>), ApiError> {
    require_member(&db, project_id, &caller)?;
    require_text("title", &input.title)?;
    require_order(input.order)?;

    let item = db.create_roadmap_item(project_id, input)?;
    Ok((StatusCode::CREATED, Json(item)))
}

// ============================================================
// Sprints
// ============================================================

pub async fn list_sprints(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Sprint>>, ApiError> {
    require_member(&db, project_id, &caller)?;
    Ok(Json(db.get_sprints(project_id)?))
}

pub async fn create_sprint(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    JsonBody(input): JsonBody<CreateSprintInput>,
) -> Result<(StatusCode, Json<Sprint>), ApiError> {
    require_member(&db, project_id, &caller)?;
    require_text("name", &input.name)?;
    require_order(input.order)?;

    if let (Some(starts_on), Some(ends_on)) = (input.starts_on, input.ends_on) {
        if ends_on < starts_on {
            return Err(ApiError::invalid_field("ends_on", "Must not be before starts_on"));
        }
    }

    let sprint = db.create_sprint(project_id, input)?;
    Ok((StatusCode::CREATED, Json(sprint)))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    require_member(&db, project_id, &caller)?;
    Ok(Json(db.get_tasks(project_id, query.sprint_id)?))
}

pub async fn create_task(
    State(db): State<Database>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    JsonBody(input): JsonBody<CreateTaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    require_member(&db, project_id, &caller)?;
    require_text("title", &input.title)?;
    require_order(input.order)?;

    if let Some(sprint_id) = input.sprint_id {
        let sprint = db.get_sprint(sprint_id)?;
        if sprint.map(|s| s.project_id) != Some(project_id) {
            return Err(ApiError::NotFound("Sprint not found".to_string()));
        }
    }

    let task = db.create_task(project_id, input)?;
    Ok((StatusCode::CREATED, Json(task)))
}
