//! Chat routes.
//!
//! `POST /chat` answers inside an existing session or creates one on the fly.
//! Answered calls and internal failures are counted in the request metrics;
//! caller errors (unknown session, invalid body) are not.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use persona_core::SessionConfig;
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::extract::ApiJson;
use crate::schemas::chat::{
    validate_message, ChatRequest, ChatResponse, CompareRequest, CompareResponse, ComparisonEntry,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(chat, compare),
    components(schemas(ChatRequest, ChatResponse, CompareRequest, CompareResponse, ComparisonEntry))
)]
pub struct ChatApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/compare", post(compare))
}

/// Send a message and get a personality-flavored reply.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply generated", body = ChatResponse),
        (status = 404, description = "Unknown session_id"),
        (status = 422, description = "Invalid request body"),
        (status = 500, description = "Internal error"),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    validate_message(&req.message)?;
    debug!(
        personality = %req.personality,
        technique = %req.technique,
        session_id = ?req.session_id,
        message_chars = req.message.chars().count(),
        "chat request"
    );

    let started = Instant::now();
    let result = answer(&state, req).await;
    match &result {
        Ok(_) => state.metrics.record_success(started.elapsed().as_secs_f64()),
        Err(ServerError::Internal(_)) => state.metrics.record_failure(),
        Err(_) => {}
    }
    result.map(Json)
}

async fn answer(state: &AppState, req: ChatRequest) -> Result<ChatResponse, ServerError> {
    let session_id = match req.session_id {
        Some(id) => id,
        None => {
            state
                .engine
                .create_session(req.personality, SessionConfig::default())
                .await?
                .id
        }
    };
    let reply = state
        .engine
        .chat(&session_id, &req.message, req.technique)
        .await?;
    Ok(reply.into())
}

/// Ask every personality the same question.
///
/// Each personality answers in its own throwaway session, deleted afterwards.
#[utoipa::path(
    post,
    path = "/chat/compare",
    tag = "chat",
    request_body = CompareRequest,
    responses(
        (status = 200, description = "One entry per personality", body = CompareResponse),
        (status = 422, description = "Invalid request body"),
    )
)]
pub async fn compare(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CompareRequest>,
) -> Result<Json<CompareResponse>, ServerError> {
    validate_message(&req.message)?;
    let results = state.engine.compare(&req.message, req.technique).await?;
    Ok(Json(CompareResponse {
        message: req.message,
        technique: req.technique,
        results: results.into_iter().map(ComparisonEntry::from).collect(),
    }))
}
