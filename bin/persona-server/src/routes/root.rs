//! API index and demo routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use persona_core::{PersonalityId, SessionConfig, TechniqueId};
use strum::IntoEnumIterator;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::info::{ApiInfo, DemoResponse};
use crate::state::AppState;

const DEMO_MESSAGE: &str = "Hello, can you help me optimize my Python code?";
const DEMO_PREVIEW_CHARS: usize = 200;

const ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /metrics",
    "GET /personalities",
    "GET /techniques",
    "POST /sessions",
    "GET /sessions",
    "DELETE /sessions",
    "POST /chat",
    "POST /chat/compare",
    "GET /session/{id}/analysis",
    "DELETE /session/{id}",
    "GET /demo/test",
    "GET /benchmark",
    "GET /dashboard",
    "GET /api-docs/openapi.json",
];

#[derive(OpenApi)]
#[openapi(paths(api_info, demo_test), components(schemas(ApiInfo, DemoResponse)))]
pub struct RootApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api_info))
        .route("/demo/test", get(demo_test))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "info",
    responses((status = 200, description = "API overview", body = ApiInfo))
)]
pub async fn api_info() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "persona-server".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        description: env!("CARGO_PKG_DESCRIPTION").into(),
        personalities: PersonalityId::iter().map(|p| p.to_string()).collect(),
        techniques: TechniqueId::iter().map(|t| t.to_string()).collect(),
        endpoints: ENDPOINTS.iter().map(|e| (*e).to_owned()).collect(),
        dashboard: "/dashboard".into(),
    })
}

/// One canned exchange on a fresh technical-expert session.
///
/// The session is left in place so it can be inspected afterwards.
#[utoipa::path(
    get,
    path = "/demo/test",
    tag = "info",
    responses((status = 200, description = "Demo exchange", body = DemoResponse))
)]
pub async fn demo_test(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DemoResponse>, ServerError> {
    let session = state
        .engine
        .create_session(PersonalityId::TechnicalExpert, SessionConfig::default())
        .await?;
    let reply = state
        .engine
        .chat(&session.id, DEMO_MESSAGE, TechniqueId::ChainOfThought)
        .await?;

    let mut preview: String = reply.response.chars().take(DEMO_PREVIEW_CHARS).collect();
    preview.push_str("...");
    Ok(Json(DemoResponse {
        message: "Demo test completed successfully".into(),
        session_id: session.id,
        test_response: preview,
        processing_time: reply.processing_time,
    }))
}
