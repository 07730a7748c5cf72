use std::collections::BTreeMap;

use persona_core::ModelStatus;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemoryUsage {
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
    pub percent: f64,
}

/// `GET /metrics` payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Host CPU utilisation, percent.
    pub cpu_usage: f32,
    pub memory_usage: MemoryUsage,
    pub active_sessions: usize,
    pub total_requests: u64,
    pub error_count: u64,
    pub error_rate: f64,
    /// Rolling mean over recent `/chat` calls, seconds.
    pub avg_response_time: f64,
    pub recent_response_times: Vec<f64>,
    pub sessions_by_personality: BTreeMap<String, usize>,
    pub uptime_seconds: u64,
    /// `{"state": "disabled" | "not_loaded" | "loading" | "loaded" | "unavailable", "model"?}`
    #[schema(value_type = Object)]
    pub model_status: ModelStatus,
    pub timestamp: String,
}
