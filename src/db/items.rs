//! Create and list operations for the orderable resources.
//!
//! Every list is sorted by `sort_order`, then `created_at`, then `id`, so
//! duplicate order values still produce a stable sequence.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_date, parse_date, parse_datetime, parse_uuid, timestamp, Database};
use crate::models::*;

impl Database {
    // ============================================================
    // Feature operations
    // ============================================================

    pub fn create_feature(&self, project_id: Uuid, input: CreateFeatureInput) -> Result<Feature> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let state = input.state.unwrap_or(FeatureState::Proposed);
        let order = match input.order {
            Some(order) => order,
            None => next_order(&conn, Resource::Features, "project_id", project_id)?,
        };

        conn.execute(
            "INSERT INTO features (id, project_id, title, details, state, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                &input.title,
                &input.details,
                state.as_str(),
                order,
                timestamp(now),
                timestamp(now),
            ),
        )?;

        Ok(Feature {
            id,
            project_id,
            title: input.title,
            details: input.details,
            state,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_feature(&self, id: Uuid) -> Result<Option<Feature>> {
        let conn = self.lock();
        let feature = conn
            .query_row(
                "SELECT id, project_id, title, details, state, sort_order, created_at, updated_at
                 FROM features WHERE id = ?",
                [id.to_string()],
                feature_from_row,
            )
            .optional()?;
        Ok(feature)
    }

    pub fn get_features_by_project(&self, project_id: Uuid) -> Result<Vec<Feature>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, details, state, sort_order, created_at, updated_at
             FROM features WHERE project_id = ? ORDER BY sort_order, created_at, id",
        )?;

        let features = stmt
            .query_map([project_id.to_string()], feature_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(features)
    }

    // ============================================================
    // Comment operations
    // ============================================================

    pub fn create_comment(
        &self,
        feature: &Feature,
        author: &str,
        input: CreateCommentInput,
    ) -> Result<Comment> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let order = match input.order {
            Some(order) => order,
            None => next_order(&conn, Resource::Comments, "feature_id", feature.id)?,
        };

        conn.execute(
            "INSERT INTO comments (id, project_id, feature_id, author, body, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                feature.project_id.to_string(),
                feature.id.to_string(),
                author,
                &input.body,
                order,
                timestamp(now),
                timestamp(now),
            ),
        )?;

        Ok(Comment {
            id,
            project_id: feature.project_id,
            feature_id: feature.id,
            author: author.to_string(),
            body: input.body,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_comments_by_feature(&self, feature_id: Uuid) -> Result<Vec<Comment>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, feature_id, author, body, sort_order, created_at, updated_at
             FROM comments WHERE feature_id = ? ORDER BY sort_order, created_at, id",
        )?;

        let comments = stmt
            .query_map([feature_id.to_string()], |row| {
                Ok(Comment {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    project_id: parse_uuid(row.get::<_, String>(1)?),
                    feature_id: parse_uuid(row.get::<_, String>(2)?),
                    author: row.get(3)?,
                    body: row.get(4)?,
                    order: row.get(5)?,
                    created_at: parse_datetime(row.get::<_, String>(6)?),
                    updated_at: parse_datetime(row.get::<_, String>(7)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    // ============================================================
    // Roadmap operations
    // ============================================================

    pub fn create_roadmap_item(
        &self,
        project_id: Uuid,
        input: CreateRoadmapItemInput,
    ) -> Result<RoadmapItem> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let order = match input.order {
            Some(order) => order,
            None => next_order(&conn, Resource::RoadmapItems, "project_id", project_id)?,
        };

        conn.execute(
            "INSERT INTO roadmap_items (id, project_id, title, theme, target_date, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                &input.title,
                &input.theme,
                format_date(input.target_date),
                order,
                timestamp(now),
                timestamp(now),
            ),
        )?;

        Ok(RoadmapItem {
            id,
            project_id,
            title: input.title,
            theme: input.theme,
            target_date: input.target_date,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_roadmap_items(&self, project_id: Uuid) -> Result<Vec<RoadmapItem>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, theme, target_date, sort_order, created_at, updated_at
             FROM roadmap_items WHERE project_id = ? ORDER BY sort_order, created_at, id",
        )?;

        let items = stmt
            .query_map([project_id.to_string()], |row| {
                Ok(RoadmapItem {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    project_id: parse_uuid(row.get::<_, String>(1)?),
                    title: row.get(2)?,
                    theme: row.get(3)?,
                    target_date: parse_date(row.get(4)?),
                    order: row.get(5)?,
                    created_at: parse_datetime(row.get::<_, String>(6)?),
                    updated_at: parse_datetime(row.get::<_, String>(7)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    // ============================================================
    // Sprint operations
    // ============================================================

    pub fn create_sprint(&self, project_id: Uuid, input: CreateSprintInput) -> Result<Sprint> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let order = match input.order {
            Some(order) => order,
            None => next_order(&conn, Resource::Sprints, "project_id", project_id)?,
        };

        conn.execute(
            "INSERT INTO sprints (id, project_id, name, goal, starts_on, ends_on, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                &input.name,
                &input.goal,
                format_date(input.starts_on),
                format_date(input.ends_on),
                order,
                timestamp(now),
                timestamp(now),
            ),
        )?;

        Ok(Sprint {
            id,
            project_id,
            name: input.name,
            goal: input.goal,
            starts_on: input.starts_on,
            ends_on: input.ends_on,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_sprint(&self, id: Uuid) -> Result<Option<Sprint>> {
        let conn = self.lock();
        let sprint = conn
            .query_row(
                "SELECT id, project_id, name, goal, starts_on, ends_on, sort_order, created_at, updated_at
                 FROM sprints WHERE id = ?",
                [id.to_string()],
                sprint_from_row,
            )
            .optional()?;
        Ok(sprint)
    }

    pub fn get_sprints(&self, project_id: Uuid) -> Result<Vec<Sprint>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, name, goal, starts_on, ends_on, sort_order, created_at, updated_at
             FROM sprints WHERE project_id = ? ORDER BY sort_order, created_at, id",
        )?;

        let sprints = stmt
            .query_map([project_id.to_string()], sprint_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sprints)
    }

    // ============================================================
    // Task operations
    // ============================================================

    /// Create a task. The caller is responsible for checking that
    /// `input.sprint_id` belongs to the same project.
    pub fn create_task(&self, project_id: Uuid, input: CreateTaskInput) -> Result<Task> {
        let conn = self.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or(TaskStatus::Todo);
        let order = match input.order {
            Some(order) => order,
            None => next_order(&conn, Resource::Tasks, "project_id", project_id)?,
        };

        conn.execute(
            "INSERT INTO tasks (id, project_id, sprint_id, title, status, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                input.sprint_id.map(|u| u.to_string()),
                &input.title,
                status.as_str(),
                order,
                timestamp(now),
                timestamp(now),
            ),
        )?;

        Ok(Task {
            id,
            project_id,
            sprint_id: input.sprint_id,
            title: input.title,
            status,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    /// Tasks of a project, optionally narrowed to one sprint.
    pub fn get_tasks(&self, project_id: Uuid, sprint_id: Option<Uuid>) -> Result<Vec<Task>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, sprint_id, title, status, sort_order, created_at, updated_at
             FROM tasks
             WHERE project_id = ?1 AND (?2 IS NULL OR sprint_id = ?2)
             ORDER BY sort_order, created_at, id",
        )?;

        let tasks = stmt
            .query_map(
                (project_id.to_string(), sprint_id.map(|u| u.to_string())),
                |row| {
                    Ok(Task {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        project_id: parse_uuid(row.get::<_, String>(1)?),
                        sprint_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
                        title: row.get(3)?,
                        status: TaskStatus::from_str(&row.get::<_, String>(4)?)
                            .unwrap_or(TaskStatus::Todo),
                        order: row.get(5)?,
                        created_at: parse_datetime(row.get::<_, String>(6)?),
                        updated_at: parse_datetime(row.get::<_, String>(7)?),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }
}

/// Next free position at the end of a scoping set (0 for an empty set).
///
/// The increment happens in Rust: SQLite silently widens an overflowing
/// `MAX(...) + 1` to REAL.
fn next_order(
    conn: &Connection,
    resource: Resource,
    scope_column: &str,
    scope_id: Uuid,
) -> rusqlite::Result<i64> {
    let max: Option<i64> = conn.query_row(
        &format!(
            "SELECT MAX(sort_order) FROM {} WHERE {} = ?",
            resource.table(),
            scope_column
        ),
        [scope_id.to_string()],
        |row| row.get(0),
    )?;

    match max {
        None => Ok(0),
        Some(max) => max
            .checked_add(1)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, max)),
    }
}

fn feature_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        details: row.get(3)?,
        state: FeatureState::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(FeatureState::Proposed),
        order: row.get(5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn sprint_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        goal: row.get(3)?,
        starts_on: parse_date(row.get(4)?),
        ends_on: parse_date(row.get(5)?),
        order: row.get(6)?,
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}
