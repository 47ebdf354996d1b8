//! Caller identity supplied by the authentication proxy.
//!
//! Planboard does not manage sessions. The auth service in front of it
//! authenticates the user and forwards the identity in [`USER_HEADER`].

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "X-User-Id";

/// The authenticated user making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match user_id {
            Some(user_id) => Ok(Caller {
                user_id: user_id.to_string(),
            }),
            None => {
                tracing::warn!("Missing {} header", USER_HEADER);
                Err(ApiError::Unauthorized)
            }
        }
    }
}
