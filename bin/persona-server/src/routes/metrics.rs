//! System and request metrics.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::metrics::{MemoryUsage, MetricsResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_metrics), components(schemas(MetricsResponse, MemoryUsage)))]
pub struct MetricsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(get_metrics))
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "metrics",
    responses(
        (status = 200, description = "Current metrics", body = MetricsResponse),
        (status = 500, description = "Session registry unavailable"),
    )
)]
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MetricsResponse>, ServerError> {
    let registry = state.engine.registry();
    let active_sessions = registry.count().await?;
    let distribution = registry.personality_distribution().await?;

    let requests = state.metrics.snapshot();
    let system = state.system.sample();

    Ok(Json(MetricsResponse {
        cpu_usage: system.cpu_percent,
        memory_usage: MemoryUsage {
            total_gb: system.memory_total_gb,
            used_gb: system.memory_used_gb,
            available_gb: system.memory_available_gb,
            percent: system.memory_percent,
        },
        active_sessions,
        total_requests: requests.total_requests,
        error_count: requests.error_count,
        error_rate: requests.error_rate,
        avg_response_time: requests.avg_response_time,
        recent_response_times: requests.recent_response_times,
        sessions_by_personality: distribution
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        uptime_seconds: requests.uptime_seconds,
        model_status: state.engine.model_status(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}
