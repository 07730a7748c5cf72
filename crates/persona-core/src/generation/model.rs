use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, TryLockError};

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use super::{GenerationConfig, ModelStatus};

/// Models tried in order on first use.
pub const DEFAULT_MODEL_CANDIDATES: &[&str] =
    &["Qwen/Qwen2.5-0.5B-Instruct", "Qwen/Qwen2-0.5B-Instruct"];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("local model support was not compiled in (enable the `candle` feature)")]
    BackendDisabled,

    #[error("failed to load model {model}: {message}")]
    Load { model: String, message: String },

    #[error("generation failed: {0}")]
    Generate(String),

    #[error("model lock poisoned")]
    Poisoned,

    /// Another generation still holds the model, e.g. one that timed out.
    #[error("model is busy with another generation")]
    Busy,

    #[cfg(feature = "candle")]
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

impl<T> From<TryLockError<T>> for GenerationError {
    fn from(e: TryLockError<T>) -> Self {
        match e {
            TryLockError::WouldBlock => Self::Busy,
            TryLockError::Poisoned(_) => Self::Poisoned,
        }
    }
}

/// A loaded model that turns a prompt into raw text.
///
/// `generate` is blocking and CPU-bound; callers run it on the blocking pool.
pub trait TextGenerator: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError>;
}

/// Loads one named candidate. Runs on the blocking pool.
pub type LoadFn =
    Arc<dyn Fn(&str) -> Result<Arc<dyn TextGenerator>, GenerationError> + Send + Sync>;

/// Loads the first working model from an ordered candidate list.
///
/// The outcome, success or failure, is decided once per process: after every
/// candidate has failed, later requests skip straight to keyword responses.
/// Loading runs in the background once [`ModelLoader::start_loading`] is
/// called; requests never wait for it.
pub struct ModelLoader {
    candidates: Vec<String>,
    load_fn: LoadFn,
    started: AtomicBool,
    state: OnceCell<Option<Arc<dyn TextGenerator>>>,
}

impl std::fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLoader")
            .field("candidates", &self.candidates)
            .field("status", &self.status())
            .finish()
    }
}

impl ModelLoader {
    pub fn new(candidates: Vec<String>, load_fn: LoadFn) -> Self {
        Self {
            candidates,
            load_fn,
            started: AtomicBool::new(false),
            state: OnceCell::new(),
        }
    }

    /// Loader backed by the candle runtime when it is compiled in.
    pub fn builtin(candidates: Vec<String>, cache_dir: Option<PathBuf>) -> Self {
        Self::new(candidates, backend_loader(cache_dir))
    }

    /// Begin loading on the current runtime unless already started.
    pub fn start_loading(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let loader = Arc::clone(self);
        tokio::spawn(async move {
            loader.get().await;
        });
    }

    /// The model if loading has finished successfully. Never waits.
    pub fn ready(&self) -> Option<Arc<dyn TextGenerator>> {
        self.state.get().and_then(|loaded| loaded.clone())
    }

    /// The loaded model, waiting for the load to finish.
    pub async fn get(&self) -> Option<Arc<dyn TextGenerator>> {
        self.started.store(true, Ordering::SeqCst);
        self.state
            .get_or_init(|| async {
                let candidates = self.candidates.clone();
                let load_fn = self.load_fn.clone();
                match tokio::task::spawn_blocking(move || load_first(&candidates, &load_fn)).await {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        error!(error = %e, "model load task failed");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    pub fn status(&self) -> ModelStatus {
        match self.state.get() {
            None if self.started.load(Ordering::SeqCst) => ModelStatus::Loading,
            None => ModelStatus::NotLoaded,
            Some(Some(model)) => ModelStatus::Loaded {
                model: model.name().to_owned(),
            },
            Some(None) => ModelStatus::Unavailable,
        }
    }
}

fn load_first(candidates: &[String], load_fn: &LoadFn) -> Option<Arc<dyn TextGenerator>> {
    for candidate in candidates {
        info!(model = %candidate, "loading model");
        match load_fn(candidate) {
            Ok(model) => {
                info!(model = %candidate, "model loaded");
                return Some(model);
            }
            Err(e) => warn!(model = %candidate, error = %e, "model candidate failed"),
        }
    }
    error!(
        tried = candidates.len(),
        "no model could be loaded; keyword responses only"
    );
    None
}

#[cfg(feature = "candle")]
fn backend_loader(cache_dir: Option<PathBuf>) -> LoadFn {
    Arc::new(move |model_id: &str| {
        let model = super::candle::CandleGenerator::load(model_id, cache_dir.as_deref())?;
        Ok(Arc::new(model) as Arc<dyn TextGenerator>)
    })
}

#[cfg(not(feature = "candle"))]
fn backend_loader(_cache_dir: Option<PathBuf>) -> LoadFn {
    Arc::new(|_: &str| Err(GenerationError::BackendDisabled))
}
