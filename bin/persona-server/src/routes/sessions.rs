//! Session management routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tracing::info;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::extract::ApiJson;
use crate::schemas::session::{
    validate_config, ClearSessionsResponse, ConversationStatsResponse, CreateSessionRequest,
    CreateSessionResponse, DeleteSessionResponse, PromptEngineeringResponse,
    SessionAnalysisResponse, SessionListResponse, SessionSummaryResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_session, list_sessions, clear_sessions, delete_session, session_analysis),
    components(schemas(
        CreateSessionRequest,
        CreateSessionResponse,
        SessionSummaryResponse,
        SessionListResponse,
        ClearSessionsResponse,
        DeleteSessionResponse,
        SessionAnalysisResponse,
        ConversationStatsResponse,
        PromptEngineeringResponse
    ))
)]
pub struct SessionApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/sessions",
            post(create_session).get(list_sessions).delete(clear_sessions),
        )
        .route("/session/{id}", delete(delete_session))
        .route("/session/{id}/analysis", get(session_analysis))
}

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = CreateSessionResponse),
        (status = 422, description = "Invalid personality or config"),
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ServerError> {
    let config = req.config.unwrap_or_default();
    validate_config(&config)?;
    let session = state.engine.create_session(req.personality, config).await?;
    Ok(Json(CreateSessionResponse::from(&session)))
}

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Live sessions, newest first", body = SessionListResponse),
    )
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionListResponse>, ServerError> {
    let sessions: Vec<SessionSummaryResponse> = state
        .engine
        .registry()
        .list()
        .await?
        .into_iter()
        .map(SessionSummaryResponse::from)
        .collect();
    Ok(Json(SessionListResponse {
        total: sessions.len(),
        sessions,
    }))
}

#[utoipa::path(
    delete,
    path = "/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "All sessions removed", body = ClearSessionsResponse),
    )
)]
pub async fn clear_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearSessionsResponse>, ServerError> {
    let cleared = state.engine.registry().delete_all().await?;
    info!(cleared, "all sessions cleared");
    Ok(Json(ClearSessionsResponse {
        message: format!("Cleared {cleared} sessions successfully"),
        cleared,
    }))
}

#[utoipa::path(
    delete,
    path = "/session/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted", body = DeleteSessionResponse),
        (status = 404, description = "Unknown session"),
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ServerError> {
    if !state.engine.registry().delete(&id).await? {
        return Err(ServerError::NotFound(format!("Session {id} not found")));
    }
    Ok(Json(DeleteSessionResponse {
        message: format!("Session {id} deleted successfully"),
    }))
}

#[utoipa::path(
    get,
    path = "/session/{id}/analysis",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Conversation analysis", body = SessionAnalysisResponse),
        (status = 404, description = "Unknown session"),
    )
)]
pub async fn session_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionAnalysisResponse>, ServerError> {
    let analysis = state.engine.analysis(&id).await?;
    Ok(Json(analysis.into()))
}
