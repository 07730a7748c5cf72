//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a `{"detail": "..."}`
//! JSON body with a matching status code.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use persona_core::{EngineError, RegistryError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// All errors that can occur in the persona-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller referenced a resource that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Malformed JSON, a schema violation, or an out-of-range field.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Validation(m) => {
                warn!(detail = %m, "request rejected");
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServerError::Internal(m) => {
                error!(detail = %m, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::SessionNotFound(_) => ServerError::NotFound(e.to_string()),
            EngineError::Registry(inner) => inner.into(),
        }
    }
}

impl From<RegistryError> for ServerError {
    fn from(e: RegistryError) -> Self {
        ServerError::Internal(e.to_string())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ServerError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn session_not_found_maps_to_404_with_detail() {
        let err: ServerError = EngineError::SessionNotFound("session_1_abcd0123".into()).into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Session session_1_abcd0123 not found");
    }

    #[tokio::test]
    async fn validation_maps_to_422() {
        let (status, body) = body_of(ServerError::Validation("bad field".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "bad field");
    }

    #[tokio::test]
    async fn registry_failure_maps_to_500() {
        let err: ServerError = EngineError::Registry(RegistryError::Closed).into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().is_some());
    }
}
