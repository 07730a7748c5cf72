use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::model::ModelLoader;
use super::prompt::{clean_response, format_prompt, MIN_RESPONSE_CHARS};
use super::{Attempt, GenerationRequest, ModelStatus, Reply, ResponseSource};

/// One way of answering a message.
#[async_trait]
pub trait AttemptStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, request: &GenerationRequest<'_>) -> Attempt;
}

/// Local language model stage.
#[derive(Debug)]
pub struct ModelStage {
    loader: Arc<ModelLoader>,
    timeout: Duration,
}

impl ModelStage {
    pub fn new(loader: Arc<ModelLoader>, timeout: Duration) -> Self {
        Self { loader, timeout }
    }
}

#[async_trait]
impl AttemptStage for ModelStage {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn attempt(&self, request: &GenerationRequest<'_>) -> Attempt {
        let Some(model) = self.loader.ready() else {
            return match self.loader.status() {
                ModelStatus::NotLoaded | ModelStatus::Loading => {
                    self.loader.start_loading();
                    Attempt::Unavailable("model still loading".into())
                }
                _ => Attempt::Unavailable("no model loaded".into()),
            };
        };

        let prompt = format_prompt(
            request.personality,
            request.technique,
            request.history,
            request.message,
        );
        let config = request.config.clone();
        let worker = model.clone();
        // A timed-out task keeps running on the blocking pool; its output is dropped.
        let task = tokio::task::spawn_blocking(move || worker.generate(&prompt, &config));

        let raw = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                return Attempt::Unavailable(format!(
                    "generation timed out after {}s",
                    self.timeout.as_secs_f64()
                ));
            }
            Ok(Err(join)) => return Attempt::Unavailable(format!("generation task failed: {join}")),
            Ok(Ok(Err(e))) => return Attempt::Unavailable(e.to_string()),
            Ok(Ok(Ok(raw))) => raw,
        };

        let text = clean_response(&raw);
        if text.chars().count() < MIN_RESPONSE_CHARS {
            return Attempt::Unavailable(format!(
                "model output too short ({} chars)",
                text.chars().count()
            ));
        }
        Attempt::Success(Reply {
            text,
            source: ResponseSource::Model {
                model: model.name().to_owned(),
            },
        })
    }
}

/// Deterministic keyword stage. Never unavailable.
#[derive(Debug, Default)]
pub struct KeywordStage;

impl KeywordStage {
    fn reply(request: &GenerationRequest<'_>) -> Reply {
        let body = request.personality.select(request.message);
        Reply {
            text: format!("{}{body}", request.technique.prefix),
            source: ResponseSource::Keyword,
        }
    }
}

#[async_trait]
impl AttemptStage for KeywordStage {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn attempt(&self, request: &GenerationRequest<'_>) -> Attempt {
        Attempt::Success(Self::reply(request))
    }
}

/// Ordered stages; the keyword stage is always appended last.
pub struct GenerationPipeline {
    stages: Vec<Box<dyn AttemptStage>>,
    loader: Option<Arc<ModelLoader>>,
}

impl GenerationPipeline {
    /// Keyword responses only.
    pub fn keyword_only() -> Self {
        Self {
            stages: vec![Box::new(KeywordStage)],
            loader: None,
        }
    }

    /// Model first, keyword fallback.
    pub fn with_model(loader: Arc<ModelLoader>, timeout: Duration) -> Self {
        Self {
            stages: vec![
                Box::new(ModelStage::new(loader.clone(), timeout)),
                Box::new(KeywordStage),
            ],
            loader: Some(loader),
        }
    }

    /// Custom leading stages followed by the keyword stage.
    pub fn from_stages(mut stages: Vec<Box<dyn AttemptStage>>) -> Self {
        stages.push(Box::new(KeywordStage));
        Self {
            stages,
            loader: None,
        }
    }

    pub fn model_status(&self) -> ModelStatus {
        match &self.loader {
            Some(loader) => loader.status(),
            None => ModelStatus::Disabled,
        }
    }

    pub async fn run(&self, request: &GenerationRequest<'_>) -> Reply {
        for stage in &self.stages {
            match stage.attempt(request).await {
                Attempt::Success(reply) => return reply,
                Attempt::Unavailable(reason) => {
                    debug!(stage = stage.name(), %reason, "stage unavailable, trying next");
                }
            }
        }
        KeywordStage::reply(request)
    }
}

impl std::fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("GenerationPipeline")
            .field("stages", &names)
            .finish()
    }
}
