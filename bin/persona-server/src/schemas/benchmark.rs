use persona_core::{BenchmarkCase, ResponseSource, TechniqueId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::metrics::HostInfo;

/// `GET /benchmark` payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BenchmarkResponse {
    pub benchmark_completed: String,
    /// Wall time for the whole run, seconds.
    pub total_time: f64,
    pub average_response_time: f64,
    pub test_count: usize,
    pub system_info: BenchmarkSystemInfo,
    pub detailed_results: Vec<BenchmarkResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BenchmarkSystemInfo {
    pub cpu_cores: usize,
    pub memory_gb: f64,
    pub platform: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BenchmarkResult {
    pub message: String,
    #[schema(value_type = String)]
    pub technique: TechniqueId,
    pub response_time: f64,
    /// Characters in the reply.
    pub response_length: usize,
    #[schema(value_type = Object)]
    pub source: ResponseSource,
}

impl From<HostInfo> for BenchmarkSystemInfo {
    fn from(h: HostInfo) -> Self {
        Self {
            cpu_cores: h.cpu_cores,
            memory_gb: h.memory_gb,
            platform: h.platform,
        }
    }
}

impl From<BenchmarkCase> for BenchmarkResult {
    fn from(c: BenchmarkCase) -> Self {
        Self {
            message: c.message,
            technique: c.technique,
            response_time: c.response_time,
            response_length: c.response_length,
            source: c.source,
        }
    }
}
