mod items;
mod order;
mod schema;

pub use order::{Access, OrderError};

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::models::*;

/// Handle to the SQLite store.
///
/// Cloning is cheap; all clones share one connection behind a mutex. The
/// handle is opened and migrated at process start, injected into the router
/// as state, and closed with [`Database::close`] at shutdown.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "planboard")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("planboard.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    /// Close the underlying connection.
    ///
    /// Only the last handle actually closes it; if other clones are still
    /// alive the connection is closed when they drop.
    pub fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex
                    .into_inner()
                    .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
                conn.close().map_err(|(_, e)| e)?;
                tracing::info!("Database closed");
            }
            Err(_) => {
                tracing::warn!("Database handle still shared at close; deferring to last drop");
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Project operations
    // ============================================================

    /// Create a project and register `owner` as its owner in one transaction.
    pub fn create_project(&self, input: CreateProjectInput, owner: &str) -> Result<Project> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        tx.execute(
            "INSERT INTO projects (id, name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.description,
                timestamp(now),
                timestamp(now),
            ),
        )?;
        tx.execute(
            "INSERT INTO project_members (project_id, user_id, role, created_at)
             VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                owner,
                MemberRole::Owner.as_str(),
                timestamp(now),
            ),
        )?;
        tx.commit()?;

        Ok(Project {
            id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.lock();
        let project = conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at
                 FROM projects WHERE id = ?",
                [id.to_string()],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    /// Projects the user is a member of, ordered by name.
    pub fn get_projects_for_user(&self, user_id: &str) -> Result<Vec<Project>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.description, p.created_at, p.updated_at
             FROM projects p
             JOIN project_members m ON m.project_id = p.id
             WHERE m.user_id = ?
             ORDER BY p.name",
        )?;

        let projects = stmt
            .query_map([user_id], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn delete_project(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM projects WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Membership operations
    // ============================================================

    pub fn get_member(&self, project_id: Uuid, user_id: &str) -> Result<Option<ProjectMember>> {
        let conn = self.lock();
        let member = conn
            .query_row(
                "SELECT project_id, user_id, role, created_at
                 FROM project_members WHERE project_id = ? AND user_id = ?",
                (project_id.to_string(), user_id),
                member_from_row,
            )
            .optional()?;
        Ok(member)
    }

    pub fn get_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT project_id, user_id, role, created_at
             FROM project_members WHERE project_id = ? ORDER BY created_at, user_id",
        )?;

        let members = stmt
            .query_map([project_id.to_string()], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(members)
    }

    /// Add a member. Returns `None` if the user is already a member.
    pub fn add_member(
        &self,
        project_id: Uuid,
        input: AddMemberInput,
    ) -> Result<Option<ProjectMember>> {
        let conn = self.lock();
        let role = input.role.unwrap_or(MemberRole::Member);
        let now = Utc::now();

        let inserted = conn.execute(
            "INSERT INTO project_members (project_id, user_id, role, created_at)
             VALUES (?, ?, ?, ?)",
            (
                project_id.to_string(),
                &input.user_id,
                role.as_str(),
                timestamp(now),
            ),
        );

        match inserted {
            Ok(_) => Ok(Some(ProjectMember {
                project_id,
                user_id: input.user_id,
                role,
                created_at: now,
            })),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
        updated_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn member_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectMember> {
    Ok(ProjectMember {
        project_id: parse_uuid(row.get::<_, String>(0)?),
        user_id: row.get(1)?,
        role: MemberRole::from_str(&row.get::<_, String>(2)?).unwrap_or(MemberRole::Member),
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

/// Fixed-width RFC 3339 so text comparison in `ORDER BY` matches time order.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}
