use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project containing features, a roadmap, sprints and tasks.
///
/// Projects are the top-level organizational unit and the boundary for
/// authorization: a caller may only read or reorder rows of projects they
/// are a member of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership of a user in a project.
///
/// `user_id` is the opaque identity issued by the external auth service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectMember {
    pub project_id: Uuid,
    pub user_id: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

/// The role a member holds in a project.
///
/// - `Owner`: Can manage members and delete the project
/// - `Member`: Can read and edit project content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

/// Input for creating a new project. The caller becomes its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for adding a member to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberInput {
    pub user_id: String,
    /// Defaults to `Member` if not specified.
    pub role: Option<MemberRole>,
}
