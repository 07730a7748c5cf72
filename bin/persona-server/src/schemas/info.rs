use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `GET /` payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub personalities: Vec<String>,
    pub techniques: Vec<String>,
    /// `METHOD /path` for every route.
    pub endpoints: Vec<String>,
    pub dashboard: String,
}

/// `GET /demo/test` payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DemoResponse {
    pub message: String,
    pub session_id: String,
    /// First 200 characters of the reply, followed by `...`.
    pub test_response: String,
    pub processing_time: f64,
}
