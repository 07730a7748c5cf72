use persona_core::{ChatReply, PersonalityComparison, PersonalityId, ResponseSource, TechniqueId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServerError;

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Request body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[schema(min_length = 1, max_length = 4000)]
    pub message: String,
    /// Used only when a new session is created; an existing session keeps
    /// the personality it was created with.
    #[serde(default)]
    #[schema(value_type = String, example = "technical_expert")]
    pub personality: PersonalityId,
    /// Continue an existing session. Omit to start a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = String, example = "standard")]
    pub technique: TechniqueId,
}

/// Request body for `POST /chat/compare`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompareRequest {
    #[schema(min_length = 1, max_length = 4000)]
    pub message: String,
    #[serde(default)]
    #[schema(value_type = String, example = "standard")]
    pub technique: TechniqueId,
}

/// Response body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    #[schema(value_type = String)]
    pub personality: PersonalityId,
    #[schema(value_type = String)]
    pub technique: TechniqueId,
    /// Seconds.
    pub processing_time: f64,
    pub timestamp: String,
    /// `{"kind": "keyword"}` or `{"kind": "model", "model": "..."}`.
    #[schema(value_type = Object)]
    pub source: ResponseSource,
}

/// One personality's entry in `POST /chat/compare`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComparisonEntry {
    #[schema(value_type = String)]
    pub personality: PersonalityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub source: Option<ResponseSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for `POST /chat/compare`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompareResponse {
    pub message: String,
    #[schema(value_type = String)]
    pub technique: TechniqueId,
    pub results: Vec<ComparisonEntry>,
}

/// Reject empty or oversized messages.
pub fn validate_message(message: &str) -> Result<(), ServerError> {
    let len = message.chars().count();
    if len == 0 {
        return Err(ServerError::Validation(
            "message: must contain at least 1 character".into(),
        ));
    }
    if len > MAX_MESSAGE_CHARS {
        return Err(ServerError::Validation(format!(
            "message: {len} characters exceeds the maximum of {MAX_MESSAGE_CHARS}"
        )));
    }
    Ok(())
}

impl From<ChatReply> for ChatResponse {
    fn from(r: ChatReply) -> Self {
        Self {
            response: r.response,
            session_id: r.session_id,
            personality: r.personality,
            technique: r.technique,
            processing_time: r.processing_time,
            timestamp: r.timestamp.to_rfc3339(),
            source: r.source,
        }
    }
}

impl From<PersonalityComparison> for ComparisonEntry {
    fn from(c: PersonalityComparison) -> Self {
        match c.outcome {
            Ok(reply) => Self {
                personality: c.personality,
                response: Some(reply.response),
                processing_time: Some(reply.processing_time),
                source: Some(reply.source),
                error: None,
            },
            Err(error) => Self {
                personality: c.personality,
                response: None,
                processing_time: None,
                source: None,
                error: Some(error),
            },
        }
    }
}
