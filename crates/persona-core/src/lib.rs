//! persona-core – conversation sessions and response selection.
//!
//! Layers, bottom-up:
//! - [`catalog`]: static personalities (ordered keyword rules) and techniques.
//! - [`session`]: the session registry, an actor that owns every session.
//! - [`generation`]: ordered attempt stages (optional local model, then
//!   keyword rules) producing a tagged [`generation::Attempt`].
//! - [`engine`]: ties a session, a message and a technique together.

pub mod catalog;
pub mod engine;
pub mod generation;
pub mod session;

pub use catalog::{Catalog, Personality, PersonalityId, Technique, TechniqueId};
pub use engine::{
    BenchmarkCase, BenchmarkReport, ChatEngine, ChatReply, ConversationStats, EngineError,
    PersonalityComparison, SessionAnalysis, TechniqueUsage, BENCHMARK_CASES,
};
pub use generation::{GenerationConfig, ModelStatus, ResponseSource};
pub use session::{
    RegistryConfig, RegistryError, Role, Session, SessionConfig, SessionRegistry, SessionSummary,
    Turn,
};
