//! HTTP client for the Planboard API.
//!
//! Configuration is via environment variables:
//! - `PLANBOARD_URL` - Base URL (default: `http://localhost:3000/api`)
//! - `PLANBOARD_API_KEY` - API key, required when the server has one configured
//! - `PLANBOARD_USER` - Identity forwarded in the `X-User-Id` header

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::api::caller::USER_HEADER;
use crate::models::*;

/// Default URL for local development.
pub const DEFAULT_URL: &str = "http://localhost:3000/api";

/// Client-side failures, one variant per server error kind.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request: {message}")]
    Validation {
        message: String,
        details: Vec<FieldIssue>,
    },

    #[error("Unauthorized: identity or API key missing or invalid")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Error body returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Vec<FieldIssue>,
}

#[derive(Debug, Clone)]
pub struct PlanboardClient {
    base_url: String,
    api_key: Option<String>,
    user_id: Option<String>,
    client: Client,
}

impl PlanboardClient {
    pub fn from_env() -> Self {
        let base_url = std::env::var("PLANBOARD_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("PLANBOARD_API_KEY").ok();
        let user_id = std::env::var("PLANBOARD_USER").ok();
        Self::new(base_url, api_key, user_id)
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>, user_id: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            user_id,
            client: Client::new(),
        }
    }

    /// Build a request with the optional auth and identity headers.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(ref user_id) = self.user_id {
            req = req.header(USER_HEADER, user_id);
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    /// Convert a non-success response into the matching error kind.
    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = if body.error.is_empty() { text } else { body.error };

        match status {
            StatusCode::BAD_REQUEST => ClientError::Validation {
                message,
                details: body.details,
            },
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            _ => ClientError::Server(format!("{}: {}", status, message)),
        }
    }

    // ============================================================
    // Ordering
    // ============================================================

    /// Send one reorder batch to `PATCH /{resource}/order`.
    pub async fn update_order(
        &self,
        resource: Resource,
        entries: &[OrderEntry],
    ) -> Result<ReorderResponse, ClientError> {
        let response = self
            .request(Method::PATCH, &resource.order_path())
            .json(&ReorderRequest {
                items: entries.to_vec(),
            })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// List any orderable resource in its scoping set, reduced to the common shape.
    pub async fn list_items(
        &self,
        resource: Resource,
        scope_id: Uuid,
    ) -> Result<Vec<ItemSummary>, ClientError> {
        let response = self
            .request(Method::GET, &resource.list_path(scope_id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Projects
    // ============================================================

    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        let response = self.request(Method::GET, "/projects").send().await?;
        self.handle_response(response).await
    }

    pub async fn create_project(&self, input: &CreateProjectInput) -> Result<Project, ClientError> {
        let response = self
            .request(Method::POST, "/projects")
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn add_member(
        &self,
        project_id: Uuid,
        input: &AddMemberInput,
    ) -> Result<ProjectMember, ClientError> {
        let response = self
            .request(Method::POST, &format!("/projects/{}/members", project_id))
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Features and comments
    // ============================================================

    pub async fn list_features(&self, project_id: Uuid) -> Result<Vec<Feature>, ClientError> {
        let response = self
            .request(Method::GET, &Resource::Features.list_path(project_id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn create_feature(
        &self,
        project_id: Uuid,
        input: &CreateFeatureInput,
    ) -> Result<Feature, ClientError> {
        let response = self
            .request(Method::POST, &Resource::Features.list_path(project_id))
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn list_comments(&self, feature_id: Uuid) -> Result<Vec<Comment>, ClientError> {
        let response = self
            .request(Method::GET, &Resource::Comments.list_path(feature_id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn create_comment(
        &self,
        feature_id: Uuid,
        input: &CreateCommentInput,
    ) -> Result<Comment, ClientError> {
        let response = self
            .request(Method::POST, &Resource::Comments.list_path(feature_id))
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Planning
    // ============================================================

    pub async fn list_roadmap_items(&self, project_id: Uuid) -> Result<Vec<RoadmapItem>, ClientError> {
        let response = self
            .request(Method::GET, &Resource::RoadmapItems.list_path(project_id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn list_sprints(&self, project_id: Uuid) -> Result<Vec<Sprint>, ClientError> {
        let response = self
            .request(Method::GET, &Resource::Sprints.list_path(project_id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn list_tasks(
        &self,
        project_id: Uuid,
        sprint_id: Option<Uuid>,
    ) -> Result<Vec<Task>, ClientError> {
        let mut req = self.request(Method::GET, &Resource::Tasks.list_path(project_id));
        if let Some(sprint_id) = sprint_id {
            req = req.query(&[("sprint_id", sprint_id.to_string())]);
        }
        let response = req.send().await?;
        self.handle_response(response).await
    }
}
