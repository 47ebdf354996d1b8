use chrono::Utc;
use rusqlite::OptionalExtension;
use thiserror::Error;

use super::{timestamp, Database};
use crate::models::{OrderEntry, Resource};

/// Who is applying a reorder batch.
#[derive(Debug, Clone, Copy)]
pub enum Access<'a> {
    /// Every item must belong to a project this user is a member of.
    Member(&'a str),
    /// No membership check (internal callers and maintenance tasks).
    Trusted,
}

/// Failure kinds of a reorder batch. Any of them rolls back the whole batch.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: String },

    #[error("{resource} {id} belongs to a project the caller is not a member of")]
    Forbidden { resource: Resource, id: String },

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Database {
    /// Apply a reorder batch atomically.
    ///
    /// Each entry's `order` is written verbatim; nothing is renumbered. The
    /// lookup, the membership check and the update of every entry run inside
    /// one transaction, so either every row changes or none does.
    pub fn apply_order(
        &self,
        resource: Resource,
        entries: &[OrderEntry],
        access: Access<'_>,
    ) -> Result<(), OrderError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let now = timestamp(Utc::now());

        let lookup = format!("SELECT project_id FROM {} WHERE id = ?", resource.table());
        let update = format!(
            "UPDATE {} SET sort_order = ?, updated_at = ? WHERE id = ?",
            resource.table()
        );

        for entry in entries {
            let project_id: Option<String> = tx
                .query_row(&lookup, [&entry.id], |row| row.get(0))
                .optional()?;

            let Some(project_id) = project_id else {
                return Err(OrderError::NotFound {
                    resource,
                    id: entry.id.clone(),
                });
            };

            if let Access::Member(user_id) = access {
                let is_member: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM project_members WHERE project_id = ? AND user_id = ?)",
                    (&project_id, user_id),
                    |row| row.get(0),
                )?;
                if !is_member {
                    return Err(OrderError::Forbidden {
                        resource,
                        id: entry.id.clone(),
                    });
                }
            }

            tx.execute(&update, (entry.order, &now, &entry.id))?;
        }

        tx.commit()?;
        tracing::debug!("Reordered {} {} rows", entries.len(), resource.table());
        Ok(())
    }
}
