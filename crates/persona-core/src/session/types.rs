use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{PersonalityId, TechniqueId};
use crate::generation::ResponseSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation. Never modified once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub technique: Option<TechniqueId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub personality: Option<PersonalityId>,
    /// Seconds spent producing an assistant turn.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub processing_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<ResponseSource>,
}

impl Turn {
    pub fn user(content: impl Into<String>, technique: TechniqueId, at: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: at,
            technique: Some(technique),
            personality: None,
            processing_time: None,
            source: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        personality: PersonalityId,
        processing_time: f64,
        source: ResponseSource,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: at,
            technique: None,
            personality: Some(personality),
            processing_time: Some(processing_time),
            source: Some(source),
        }
    }
}

/// Optional per-session overrides for local model sampling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_new_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repetition_penalty: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_messages: usize,
    /// Seconds, summed over assistant turns.
    pub total_processing_time: f64,
    pub request_count: u64,
}

/// Server-side record of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub personality: PersonalityId,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub config: SessionConfig,
    pub conversation: Vec<Turn>,
    pub stats: SessionStats,
}

impl Session {
    pub(crate) fn new(
        id: String,
        personality: PersonalityId,
        config: SessionConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            personality,
            created_at: now,
            last_activity: now,
            config,
            conversation: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            personality: self.personality,
            created_at: self.created_at,
            last_activity: self.last_activity,
            message_count: self.conversation.len(),
            request_count: self.stats.request_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub personality: PersonalityId,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: usize,
    pub request_count: u64,
}
