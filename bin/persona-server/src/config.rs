//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for persona-server.
///
/// Every field has a default so the server starts without any environment
/// variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated allowed CORS origins. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI (only with the `swagger-ui` feature).
    pub enable_swagger: bool,

    /// Idle time after which a session is swept.
    pub session_ttl: Duration,

    /// Live session cap.
    pub max_sessions: usize,

    /// Period of the expiry sweep.
    pub cleanup_interval: Duration,

    /// Number of recent `/chat` latencies kept for the rolling average.
    pub metrics_window: usize,

    /// Try a local language model before keyword responses.
    pub model_enabled: bool,

    pub model_timeout: Duration,

    /// Hugging Face hub cache directory override.
    pub model_cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".into(),
            log_level: "info".into(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: true,
            session_ttl: Duration::from_secs(4 * 60 * 60),
            max_sessions: 100,
            cleanup_interval: Duration::from_secs(30 * 60),
            metrics_window: 1000,
            model_enabled: false,
            model_timeout: Duration::from_secs(30),
            model_cache_dir: None,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_or("PERSONA_BIND", &defaults.bind_address),
            log_level: env_or("PERSONA_LOG", &defaults.log_level),
            log_json: env_flag("PERSONA_LOG_JSON", defaults.log_json),
            cors_allowed_origins: std::env::var("PERSONA_CORS_ORIGINS").ok(),
            enable_swagger: env_flag("PERSONA_ENABLE_SWAGGER", defaults.enable_swagger),
            session_ttl: Duration::from_secs(parse_env(
                "PERSONA_SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )),
            max_sessions: parse_env("PERSONA_MAX_SESSIONS", defaults.max_sessions),
            cleanup_interval: Duration::from_secs(
                parse_env(
                    "PERSONA_CLEANUP_INTERVAL_SECS",
                    defaults.cleanup_interval.as_secs(),
                )
                .max(1),
            ),
            metrics_window: parse_env("PERSONA_METRICS_WINDOW", defaults.metrics_window).max(1),
            model_enabled: env_flag("PERSONA_MODEL_ENABLED", defaults.model_enabled),
            model_timeout: Duration::from_secs(parse_env(
                "PERSONA_MODEL_TIMEOUT_SECS",
                defaults.model_timeout.as_secs(),
            )),
            model_cache_dir: std::env::var_os("PERSONA_MODEL_CACHE_DIR").map(PathBuf::from),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v).unwrap_or(default))
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_address, "0.0.0.0:8000");
        assert_eq!(cfg.session_ttl, Duration::from_secs(14_400));
        assert_eq!(cfg.max_sessions, 100);
        assert_eq!(cfg.cleanup_interval, Duration::from_secs(1_800));
        assert_eq!(cfg.metrics_window, 1000);
        assert!(!cfg.model_enabled);
        assert_eq!(cfg.model_timeout, Duration::from_secs(30));
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
