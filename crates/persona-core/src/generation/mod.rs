//! Response generation.
//!
//! A [`GenerationPipeline`] is an ordered list of [`AttemptStage`]s. Each
//! stage returns an [`Attempt`]; the first [`Attempt::Success`] wins. The
//! keyword stage is always last and never fails, so a pipeline always
//! produces a [`Reply`].

mod model;
mod pipeline;
pub mod prompt;

#[cfg(feature = "candle")]
mod candle;

pub use model::{GenerationError, LoadFn, ModelLoader, TextGenerator, DEFAULT_MODEL_CANDIDATES};
pub use pipeline::{AttemptStage, GenerationPipeline, KeywordStage, ModelStage};

use serde::{Deserialize, Serialize};

use crate::catalog::{Personality, Technique};
use crate::session::{SessionConfig, Turn};

/// Where an assistant response came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseSource {
    /// Canned text selected by keyword rules.
    Keyword,
    /// Text produced by a local language model.
    Model { model: String },
}

/// A finished response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub source: ResponseSource,
}

/// Outcome of one attempt stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Success(Reply),
    /// The stage could not answer; the reason is logged and the next stage runs.
    Unavailable(String),
}

/// Everything a stage needs to answer one message.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub personality: &'a Personality,
    pub technique: &'a Technique,
    /// Conversation so far, oldest first.
    pub history: &'a [Turn],
    pub message: &'a str,
    pub config: GenerationConfig,
}

/// Sampling parameters for the local model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: usize,
    pub max_new_tokens: usize,
    pub repetition_penalty: f32,
    /// Prompt tokens kept (from the end) before decoding.
    pub context_tokens: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            max_new_tokens: 150,
            repetition_penalty: 1.1,
            context_tokens: 512,
        }
    }
}

impl GenerationConfig {
    /// Copy of `self` with any per-session overrides applied.
    pub fn with_overrides(&self, overrides: &SessionConfig) -> Self {
        Self {
            temperature: overrides.temperature.unwrap_or(self.temperature),
            top_p: overrides.top_p.unwrap_or(self.top_p),
            top_k: overrides.top_k.unwrap_or(self.top_k),
            max_new_tokens: overrides.max_new_tokens.unwrap_or(self.max_new_tokens),
            repetition_penalty: overrides
                .repetition_penalty
                .unwrap_or(self.repetition_penalty),
            context_tokens: self.context_tokens,
        }
    }
}

/// Load state of the local model, as reported by `/metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    /// Model generation is switched off by configuration.
    Disabled,
    /// Enabled, but loading has not started.
    NotLoaded,
    /// Candidates are being tried in the background.
    Loading,
    Loaded { model: String },
    /// Every candidate failed to load; keyword responses only.
    Unavailable,
}
