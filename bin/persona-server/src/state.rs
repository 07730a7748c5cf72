//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use persona_core::generation::{GenerationPipeline, ModelLoader, DEFAULT_MODEL_CANDIDATES};
use persona_core::{Catalog, ChatEngine, GenerationConfig, RegistryConfig, SessionRegistry};

use crate::config::Config;
use crate::metrics::{RequestMetrics, SystemProbe};

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Catalog, session registry and generation pipeline.
    pub engine: ChatEngine,
    /// `/chat` counters and latency window.
    pub metrics: Arc<RequestMetrics>,
    pub system: Arc<SystemProbe>,
}

impl AppState {
    /// Wire up every component from `config`. Spawns the registry actor, so
    /// this must run inside a tokio runtime.
    pub fn build(config: Config) -> Self {
        let registry = SessionRegistry::start(RegistryConfig {
            ttl: config.session_ttl,
            max_sessions: config.max_sessions,
            ..RegistryConfig::default()
        });

        let pipeline = if config.model_enabled {
            let loader = Arc::new(ModelLoader::builtin(
                DEFAULT_MODEL_CANDIDATES
                    .iter()
                    .map(|s| (*s).to_owned())
                    .collect(),
                config.model_cache_dir.clone(),
            ));
            // Load in the background; chats answer by keyword until it is ready.
            loader.start_loading();
            GenerationPipeline::with_model(loader, config.model_timeout)
        } else {
            GenerationPipeline::keyword_only()
        };

        let engine = ChatEngine::new(
            Arc::new(Catalog::builtin()),
            registry,
            Arc::new(pipeline),
            GenerationConfig::default(),
        );

        Self {
            metrics: Arc::new(RequestMetrics::new(config.metrics_window)),
            system: Arc::new(SystemProbe::new()),
            config: Arc::new(config),
            engine,
        }
    }
}
