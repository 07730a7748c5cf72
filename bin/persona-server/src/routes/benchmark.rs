//! Fixed-workload timing run.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::benchmark::{BenchmarkResponse, BenchmarkResult, BenchmarkSystemInfo};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(run_benchmark),
    components(schemas(BenchmarkResponse, BenchmarkResult, BenchmarkSystemInfo))
)]
pub struct BenchmarkApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/benchmark", get(run_benchmark))
}

/// Time a fixed set of messages on a throwaway session.
///
/// Benchmark traffic is not counted in the `/chat` request metrics.
#[utoipa::path(
    get,
    path = "/benchmark",
    tag = "info",
    responses(
        (status = 200, description = "Benchmark finished", body = BenchmarkResponse),
        (status = 500, description = "Internal error"),
    )
)]
pub async fn run_benchmark(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BenchmarkResponse>, ServerError> {
    let report = state.engine.benchmark().await?;
    Ok(Json(BenchmarkResponse {
        benchmark_completed: Utc::now().to_rfc3339(),
        total_time: report.total_time,
        average_response_time: report.average_response_time,
        test_count: report.results.len(),
        system_info: state.system.host().into(),
        detailed_results: report.results.into_iter().map(BenchmarkResult::from).collect(),
    }))
}
