//! JSON body extractor whose rejections use the API's error shape.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};

use super::error::ApiError;

/// Like [`Json`], but an unreadable body becomes a 400 with a field issue
/// instead of axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::warn!("Unreadable request body: {}", rejection.body_text());
                Err(ApiError::invalid_field("", rejection.body_text()))
            }
        }
    }
}
