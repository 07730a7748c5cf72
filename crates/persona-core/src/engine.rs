//! Chat orchestration: session lookup, generation, and history append.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, PersonalityId, TechniqueId};
use crate::generation::{
    GenerationConfig, GenerationPipeline, GenerationRequest, ModelStatus, ResponseSource,
};
use crate::session::{RegistryError, Role, Session, SessionConfig, SessionRegistry, Turn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Session {0} not found")]
    SessionNotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result of one chat exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    pub personality: PersonalityId,
    pub technique: TechniqueId,
    /// Seconds from receipt to reply.
    pub processing_time: f64,
    pub source: ResponseSource,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub total_processing_time: f64,
    pub avg_processing_time: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechniqueUsage {
    /// Distinct techniques in order of first use.
    pub techniques_used: Vec<TechniqueId>,
    pub technique_frequency: BTreeMap<TechniqueId, usize>,
    pub model_responses: usize,
    pub keyword_responses: usize,
}

/// Aggregate view of one session's history.
#[derive(Debug, Clone, Serialize)]
pub struct SessionAnalysis {
    pub session_id: String,
    pub personality: PersonalityId,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub conversation_stats: ConversationStats,
    pub prompt_engineering: TechniqueUsage,
    pub export_timestamp: DateTime<Utc>,
}

impl SessionAnalysis {
    fn of(session: &Session, now: DateTime<Utc>) -> Self {
        let mut user_messages = 0;
        let mut assistant_messages = 0;
        let mut techniques_used = Vec::new();
        let mut technique_frequency = BTreeMap::new();
        let mut model_responses = 0;
        let mut keyword_responses = 0;

        for turn in &session.conversation {
            match turn.role {
                Role::User => user_messages += 1,
                Role::Assistant => assistant_messages += 1,
            }
            if let Some(technique) = turn.technique {
                if !techniques_used.contains(&technique) {
                    techniques_used.push(technique);
                }
                *technique_frequency.entry(technique).or_insert(0) += 1;
            }
            match turn.source {
                Some(ResponseSource::Model { .. }) => model_responses += 1,
                Some(ResponseSource::Keyword) => keyword_responses += 1,
                None => {}
            }
        }

        let total = session.stats.total_processing_time;
        let avg_processing_time = if assistant_messages == 0 {
            0.0
        } else {
            total / assistant_messages as f64
        };

        Self {
            session_id: session.id.clone(),
            personality: session.personality,
            created_at: session.created_at,
            last_activity: session.last_activity,
            conversation_stats: ConversationStats {
                total_messages: session.conversation.len(),
                user_messages,
                assistant_messages,
                total_processing_time: total,
                avg_processing_time,
            },
            prompt_engineering: TechniqueUsage {
                techniques_used,
                technique_frequency,
                model_responses,
                keyword_responses,
            },
            export_timestamp: now,
        }
    }
}

/// The fixed workload run by [`ChatEngine::benchmark`].
pub const BENCHMARK_CASES: [(&str, TechniqueId); 5] = [
    ("Hello, how are you?", TechniqueId::Standard),
    ("Explain machine learning", TechniqueId::ChainOfThought),
    ("Help me debug Python code", TechniqueId::FewShot),
    ("Plan a marketing strategy", TechniqueId::StepByStep),
    ("Write a story outline", TechniqueId::RolePlaying),
];

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkCase {
    pub message: String,
    pub technique: TechniqueId,
    pub response_time: f64,
    /// Reply length in characters.
    pub response_length: usize,
    pub source: ResponseSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub total_time: f64,
    pub average_response_time: f64,
    pub results: Vec<BenchmarkCase>,
}

/// One personality's answer in a side-by-side comparison.
#[derive(Debug, Clone)]
pub struct PersonalityComparison {
    pub personality: PersonalityId,
    pub outcome: Result<ChatReply, String>,
}

/// Ties the catalog, the session registry and the generation pipeline together.
#[derive(Debug, Clone)]
pub struct ChatEngine {
    catalog: Arc<Catalog>,
    registry: SessionRegistry,
    pipeline: Arc<GenerationPipeline>,
    defaults: GenerationConfig,
}

impl ChatEngine {
    pub fn new(
        catalog: Arc<Catalog>,
        registry: SessionRegistry,
        pipeline: Arc<GenerationPipeline>,
        defaults: GenerationConfig,
    ) -> Self {
        Self {
            catalog,
            registry,
            pipeline,
            defaults,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn model_status(&self) -> ModelStatus {
        self.pipeline.model_status()
    }

    pub async fn create_session(
        &self,
        personality: PersonalityId,
        config: SessionConfig,
    ) -> Result<Session, EngineError> {
        Ok(self.registry.create(personality, config).await?)
    }

    /// Answer `message` inside an existing session and record the exchange.
    pub async fn chat(
        &self,
        session_id: &str,
        message: &str,
        technique: TechniqueId,
    ) -> Result<ChatReply, EngineError> {
        let started = Instant::now();
        let received_at = Utc::now();

        let session = self
            .registry
            .get(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_owned()))?;

        let request = GenerationRequest {
            personality: self.catalog.personality(session.personality),
            technique: self.catalog.technique(technique),
            history: &session.conversation,
            message,
            config: self.defaults.with_overrides(&session.config),
        };
        let reply = self.pipeline.run(&request).await;

        let processing_time = started.elapsed().as_secs_f64();
        let answered_at = Utc::now();
        let user = Turn::user(message, technique, received_at);
        let assistant = Turn::assistant(
            reply.text.clone(),
            session.personality,
            processing_time,
            reply.source.clone(),
            answered_at,
        );

        // The session may have been deleted or swept while generating.
        if !self
            .registry
            .append_exchange(session_id, user, assistant, processing_time)
            .await?
        {
            return Err(EngineError::SessionNotFound(session_id.to_owned()));
        }

        info!(
            session_id,
            personality = %session.personality,
            %technique,
            processing_time,
            source = ?reply.source,
            "chat answered"
        );

        Ok(ChatReply {
            response: reply.text,
            session_id: session_id.to_owned(),
            personality: session.personality,
            technique,
            processing_time,
            source: reply.source,
            timestamp: answered_at,
        })
    }

    pub async fn analysis(&self, session_id: &str) -> Result<SessionAnalysis, EngineError> {
        let session = self
            .registry
            .get(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_owned()))?;
        Ok(SessionAnalysis::of(&session, Utc::now()))
    }

    /// Ask every personality the same question, each in a throwaway session.
    pub async fn compare(
        &self,
        message: &str,
        technique: TechniqueId,
    ) -> Result<Vec<PersonalityComparison>, EngineError> {
        let mut results = Vec::with_capacity(self.catalog.personalities().len());
        for personality in self.catalog.personalities().iter().map(|p| p.id) {
            let session = self
                .registry
                .create_ephemeral(personality, SessionConfig::default())
                .await?;
            let outcome = self
                .chat(&session.id, message, technique)
                .await
                .map_err(|e| e.to_string());
            if let Err(reason) = &outcome {
                warn!(%personality, %reason, "comparison chat failed");
            }
            self.registry.delete(&session.id).await?;
            results.push(PersonalityComparison {
                personality,
                outcome,
            });
        }
        Ok(results)
    }

    /// Run [`BENCHMARK_CASES`] in order on one throwaway helpful-assistant
    /// session, which is removed afterwards.
    pub async fn benchmark(&self) -> Result<BenchmarkReport, EngineError> {
        let started = Instant::now();
        let session = self
            .registry
            .create_ephemeral(PersonalityId::HelpfulAssistant, SessionConfig::default())
            .await?;

        let mut results = Vec::with_capacity(BENCHMARK_CASES.len());
        for (message, technique) in BENCHMARK_CASES {
            let outcome = self.chat(&session.id, message, technique).await;
            let reply = match outcome {
                Ok(reply) => reply,
                Err(e) => {
                    self.registry.delete(&session.id).await?;
                    return Err(e);
                }
            };
            results.push(BenchmarkCase {
                message: message.to_owned(),
                technique,
                response_time: reply.processing_time,
                response_length: reply.response.chars().count(),
                source: reply.source,
            });
        }
        self.registry.delete(&session.id).await?;

        let total_time = started.elapsed().as_secs_f64();
        let average_response_time =
            results.iter().map(|r| r.response_time).sum::<f64>() / results.len() as f64;
        info!(
            cases = results.len(),
            total_time, average_response_time, "benchmark finished"
        );
        Ok(BenchmarkReport {
            total_time,
            average_response_time,
            results,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::RegistryConfig;

    fn engine() -> ChatEngine {
        ChatEngine::new(
            Arc::new(Catalog::builtin()),
            SessionRegistry::start(RegistryConfig::default()),
            Arc::new(GenerationPipeline::keyword_only()),
            GenerationConfig::default(),
        )
    }

    #[tokio::test]
    async fn chat_appends_two_turns_and_uses_keywords() {
        let engine = engine();
        let session = engine
            .create_session(PersonalityId::TechnicalExpert, SessionConfig::default())
            .await
            .unwrap();

        let reply = engine
            .chat(&session.id, "I have a memory leak", TechniqueId::ChainOfThought)
            .await
            .unwrap();
        let expected = engine.catalog().keyword_response(
            PersonalityId::TechnicalExpert,
            TechniqueId::ChainOfThought,
            "I have a memory leak",
        );
        assert_eq!(reply.response, expected);
        assert_eq!(reply.source, ResponseSource::Keyword);
        assert_eq!(reply.session_id, session.id);
        assert!(reply.processing_time >= 0.0);

        let stored = engine.registry().get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.conversation.len(), 2);
        assert_eq!(stored.conversation[0].role, Role::User);
        assert_eq!(stored.conversation[0].content, "I have a memory leak");
        assert_eq!(stored.conversation[1].role, Role::Assistant);
        assert_eq!(stored.conversation[1].content, expected);
        assert_eq!(stored.stats.request_count, 1);
    }

    #[tokio::test]
    async fn chat_on_unknown_session_is_not_found() {
        let engine = engine();
        let err = engine
            .chat("session_0_deadbeef", "hello", TechniqueId::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(id) if id == "session_0_deadbeef"));
        assert_eq!(engine.registry().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn analysis_counts_techniques_in_first_use_order() {
        let engine = engine();
        let session = engine
            .create_session(PersonalityId::LearningTutor, SessionConfig::default())
            .await
            .unwrap();
        for technique in [
            TechniqueId::Socratic,
            TechniqueId::Standard,
            TechniqueId::Socratic,
        ] {
            engine.chat(&session.id, "explain recursion", technique).await.unwrap();
        }

        let analysis = engine.analysis(&session.id).await.unwrap();
        assert_eq!(analysis.conversation_stats.total_messages, 6);
        assert_eq!(analysis.conversation_stats.user_messages, 3);
        assert_eq!(analysis.conversation_stats.assistant_messages, 3);
        assert_eq!(
            analysis.prompt_engineering.techniques_used,
            vec![TechniqueId::Socratic, TechniqueId::Standard]
        );
        assert_eq!(
            analysis.prompt_engineering.technique_frequency[&TechniqueId::Socratic],
            2
        );
        assert_eq!(analysis.prompt_engineering.keyword_responses, 3);
        assert_eq!(analysis.prompt_engineering.model_responses, 0);
    }

    #[tokio::test]
    async fn compare_covers_every_personality_and_cleans_up() {
        let engine = engine();
        let results = engine
            .compare("how should I price my product", TechniqueId::Standard)
            .await
            .unwrap();
        assert_eq!(results.len(), engine.catalog().personalities().len());
        for r in &results {
            let reply = r.outcome.as_ref().unwrap();
            assert_eq!(reply.personality, r.personality);
        }
        assert_eq!(engine.registry().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn compare_at_capacity_keeps_existing_sessions() {
        let engine = ChatEngine::new(
            Arc::new(Catalog::builtin()),
            SessionRegistry::start(RegistryConfig {
                max_sessions: 2,
                ..RegistryConfig::default()
            }),
            Arc::new(GenerationPipeline::keyword_only()),
            GenerationConfig::default(),
        );
        let mut ids = Vec::new();
        for _ in 0..2 {
            let s = engine
                .create_session(PersonalityId::LearningTutor, SessionConfig::default())
                .await
                .unwrap();
            ids.push(s.id);
        }

        let results = engine.compare("explain it", TechniqueId::Standard).await.unwrap();
        assert!(results.iter().all(|r| r.outcome.is_ok()));
        for id in &ids {
            assert!(engine.registry().get(id).await.unwrap().is_some(), "{id} evicted");
        }
        assert_eq!(engine.registry().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn benchmark_runs_every_case_and_cleans_up() {
        let engine = engine();
        let report = engine.benchmark().await.unwrap();

        assert_eq!(report.results.len(), BENCHMARK_CASES.len());
        for (case, (message, technique)) in report.results.iter().zip(BENCHMARK_CASES) {
            assert_eq!(case.message, message);
            assert_eq!(case.technique, technique);
            assert!(case.response_length > 0);
            assert_eq!(case.source, ResponseSource::Keyword);
        }
        let role_playing = &report.results[4];
        assert_eq!(role_playing.technique, TechniqueId::RolePlaying);
        assert!(report.total_time >= report.average_response_time);
        assert_eq!(engine.registry().count().await.unwrap(), 0);
    }
}
