use persona_core::{Personality, Technique};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One entry of `GET /personalities`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersonalityInfo {
    #[schema(example = "technical_expert")]
    pub id: String,
    pub name: String,
    pub description: String,
    /// Keywords this personality has a dedicated answer for.
    pub capabilities: Vec<String>,
    pub strengths: Vec<String>,
}

/// One entry of `GET /techniques`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TechniqueInfo {
    #[schema(example = "chain_of_thought")]
    pub id: String,
    pub description: String,
    /// Text prepended to every keyword response.
    pub prefix: String,
}

impl From<&Personality> for PersonalityInfo {
    fn from(p: &Personality) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.to_owned(),
            description: p.description.to_owned(),
            capabilities: p.keywords().into_iter().map(str::to_owned).collect(),
            strengths: p.strengths.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl From<&Technique> for TechniqueInfo {
    fn from(t: &Technique) -> Self {
        Self {
            id: t.id.to_string(),
            description: t.description.to_owned(),
            prefix: t.prefix.to_owned(),
        }
    }
}
