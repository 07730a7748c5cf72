use std::collections::BTreeMap;

use persona_core::{PersonalityId, Session, SessionAnalysis, SessionConfig, SessionSummary};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServerError;

/// Request body for `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(default)]
    #[schema(value_type = String, example = "technical_expert")]
    pub personality: PersonalityId,
    /// Sampling overrides: `temperature`, `top_p`, `top_k`,
    /// `max_new_tokens`, `repetition_penalty`. Unknown keys are rejected.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub config: Option<SessionConfig>,
}

/// Response body for `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSessionResponse {
    pub session_id: String,
    #[schema(value_type = String)]
    pub personality: PersonalityId,
    pub created_at: String,
    #[schema(value_type = Object)]
    pub config: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSummaryResponse {
    pub session_id: String,
    #[schema(value_type = String)]
    pub personality: PersonalityId,
    pub created_at: String,
    pub last_activity: String,
    pub message_count: usize,
    pub request_count: u64,
}

/// Response body for `GET /sessions`, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummaryResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearSessionsResponse {
    pub message: String,
    pub cleared: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteSessionResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationStatsResponse {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub total_processing_time: f64,
    pub avg_processing_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromptEngineeringResponse {
    /// In order of first use.
    pub techniques_used: Vec<String>,
    pub technique_frequency: BTreeMap<String, usize>,
    pub model_responses: usize,
    pub keyword_responses: usize,
}

/// Response body for `GET /session/{id}/analysis`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionAnalysisResponse {
    pub session_id: String,
    #[schema(value_type = String)]
    pub personality: PersonalityId,
    pub created_at: String,
    pub last_activity: String,
    pub conversation_stats: ConversationStatsResponse,
    pub prompt_engineering: PromptEngineeringResponse,
    pub export_timestamp: String,
}

/// Reject sampling overrides the model cannot use.
pub fn validate_config(config: &SessionConfig) -> Result<(), ServerError> {
    fn bad(field: &str, rule: &str) -> ServerError {
        ServerError::Validation(format!("config.{field}: {rule}"))
    }
    if let Some(t) = config.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(bad("temperature", "must be between 0.0 and 2.0"));
        }
    }
    if let Some(p) = config.top_p {
        if !(p > 0.0 && p <= 1.0) {
            return Err(bad("top_p", "must be in (0.0, 1.0]"));
        }
    }
    if config.top_k == Some(0) {
        return Err(bad("top_k", "must be at least 1"));
    }
    if let Some(n) = config.max_new_tokens {
        if !(1..=1024).contains(&n) {
            return Err(bad("max_new_tokens", "must be between 1 and 1024"));
        }
    }
    if let Some(r) = config.repetition_penalty {
        if !(r > 0.0 && r <= 2.0) {
            return Err(bad("repetition_penalty", "must be in (0.0, 2.0]"));
        }
    }
    Ok(())
}

impl From<&Session> for CreateSessionResponse {
    fn from(s: &Session) -> Self {
        Self {
            session_id: s.id.clone(),
            personality: s.personality,
            created_at: s.created_at.to_rfc3339(),
            config: s.config.clone(),
        }
    }
}

impl From<SessionSummary> for SessionSummaryResponse {
    fn from(s: SessionSummary) -> Self {
        Self {
            session_id: s.session_id,
            personality: s.personality,
            created_at: s.created_at.to_rfc3339(),
            last_activity: s.last_activity.to_rfc3339(),
            message_count: s.message_count,
            request_count: s.request_count,
        }
    }
}

impl From<SessionAnalysis> for SessionAnalysisResponse {
    fn from(a: SessionAnalysis) -> Self {
        let stats = a.conversation_stats;
        let usage = a.prompt_engineering;
        Self {
            session_id: a.session_id,
            personality: a.personality,
            created_at: a.created_at.to_rfc3339(),
            last_activity: a.last_activity.to_rfc3339(),
            conversation_stats: ConversationStatsResponse {
                total_messages: stats.total_messages,
                user_messages: stats.user_messages,
                assistant_messages: stats.assistant_messages,
                total_processing_time: stats.total_processing_time,
                avg_processing_time: stats.avg_processing_time,
            },
            prompt_engineering: PromptEngineeringResponse {
                techniques_used: usage
                    .techniques_used
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                technique_frequency: usage
                    .technique_frequency
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
                model_responses: usage.model_responses,
                keyword_responses: usage.keyword_responses,
            },
            export_timestamp: a.export_timestamp.to_rfc3339(),
        }
    }
}
