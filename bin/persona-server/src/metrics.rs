//! Request counters and host resource sampling for `/metrics`.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use sysinfo::System;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Latencies returned to the dashboard chart.
const RECENT_LATENCIES: usize = 50;

#[derive(Debug)]
struct Window {
    capacity: usize,
    latencies: VecDeque<f64>,
    total_requests: u64,
    errors: u64,
}

/// Counts `/chat` calls and keeps a bounded window of response times.
#[derive(Debug)]
pub struct RequestMetrics {
    window: Mutex<Window>,
    started: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestSnapshot {
    pub total_requests: u64,
    pub error_count: u64,
    /// Errors over total requests, in `[0, 1]`.
    pub error_rate: f64,
    /// Mean over the window, seconds.
    pub avg_response_time: f64,
    /// Most recent latencies, oldest first.
    pub recent_response_times: Vec<f64>,
    pub uptime_seconds: u64,
}

impl RequestMetrics {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: Mutex::new(Window {
                capacity,
                latencies: VecDeque::with_capacity(capacity),
                total_requests: 0,
                errors: 0,
            }),
            started: Instant::now(),
        }
    }

    pub fn record_success(&self, latency_secs: f64) {
        let mut w = self.window.lock().unwrap_or_else(|e| e.into_inner());
        w.total_requests += 1;
        if w.latencies.len() == w.capacity {
            w.latencies.pop_front();
        }
        w.latencies.push_back(latency_secs);
    }

    pub fn record_failure(&self) {
        let mut w = self.window.lock().unwrap_or_else(|e| e.into_inner());
        w.total_requests += 1;
        w.errors += 1;
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        let w = self.window.lock().unwrap_or_else(|e| e.into_inner());
        let avg_response_time = if w.latencies.is_empty() {
            0.0
        } else {
            w.latencies.iter().sum::<f64>() / w.latencies.len() as f64
        };
        let error_rate = if w.total_requests == 0 {
            0.0
        } else {
            w.errors as f64 / w.total_requests as f64
        };
        let skip = w.latencies.len().saturating_sub(RECENT_LATENCIES);
        RequestSnapshot {
            total_requests: w.total_requests,
            error_count: w.errors,
            error_rate,
            avg_response_time,
            recent_response_times: w.latencies.iter().skip(skip).copied().collect(),
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

/// Static facts about the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    pub cpu_cores: usize,
    pub memory_gb: f64,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub cpu_percent: f32,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
    pub memory_available_gb: f64,
    pub memory_percent: f64,
}

/// Host CPU and memory sampler.
///
/// CPU usage is measured between consecutive refreshes, so the first sample
/// after startup reads low.
#[derive(Debug)]
pub struct SystemProbe {
    sys: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self {
            sys: Mutex::new(sys),
        }
    }

    pub fn sample(&self) -> SystemSnapshot {
        let mut sys = self.sys.lock().unwrap_or_else(|e| e.into_inner());
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let total = sys.total_memory() as f64;
        let used = sys.used_memory() as f64;
        let available = sys.available_memory() as f64;
        let memory_percent = if total > 0.0 {
            (total - available) / total * 100.0
        } else {
            0.0
        };
        SystemSnapshot {
            cpu_percent: sys.global_cpu_usage(),
            memory_total_gb: round2(total / BYTES_PER_GB),
            memory_used_gb: round2(used / BYTES_PER_GB),
            memory_available_gb: round2(available / BYTES_PER_GB),
            memory_percent: round2(memory_percent),
        }
    }

    pub fn host(&self) -> HostInfo {
        let sys = self.sys.lock().unwrap_or_else(|e| e.into_inner());
        HostInfo {
            cpu_cores: sys.cpus().len(),
            memory_gb: round2(sys.total_memory() as f64 / BYTES_PER_GB),
            platform: System::long_os_version()
                .unwrap_or_else(|| std::env::consts::OS.to_owned()),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
