use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::personality::Personality;

/// Few-shot example answers are cut to this many characters in the prompt.
const EXAMPLE_PREVIEW_CHARS: usize = 200;

/// A simulated reasoning style, applied as a fixed response prefix.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TechniqueId {
    #[default]
    Standard = 0,
    ChainOfThought = 1,
    FewShot = 2,
    StepByStep = 3,
    Socratic = 4,
    Analogical = 5,
    RolePlaying = 6,
}

#[derive(Debug, Clone, Copy)]
pub struct Technique {
    pub id: TechniqueId,
    pub prefix: &'static str,
    pub description: &'static str,
}

impl Technique {
    pub fn builtin(id: TechniqueId) -> Self {
        let (prefix, description) = match id {
            TechniqueId::Standard => ("", "Standard response"),
            TechniqueId::ChainOfThought => (
                "Let me think through this systematically, step by step:\n\n",
                "Breaks down complex problems into logical steps",
            ),
            TechniqueId::FewShot => (
                "Based on similar situations I've encountered:\n\n",
                "Uses examples to demonstrate problem-solving approach",
            ),
            TechniqueId::StepByStep => (
                "I'll break this down into clear, actionable steps:\n\n",
                "Provides structured, sequential guidance",
            ),
            TechniqueId::Socratic => (
                "Let me help you explore this through guided questions:\n\n",
                "Uses questions to guide thinking and discovery",
            ),
            TechniqueId::Analogical => (
                "Let me explain this using analogies to make it clearer:\n\n",
                "Uses comparisons and metaphors for understanding",
            ),
            TechniqueId::RolePlaying => (
                "Speaking from the perspective of an expert in this field:\n\n",
                "Adopts a professional role to give grounded, practical advice",
            ),
        };
        Self {
            id,
            prefix,
            description,
        }
    }

    /// Framing placed around the user's message when prompting a model.
    ///
    /// Several techniques adapt to the personality: chain of thought names
    /// its domain, few shot replays its worked example, and role playing
    /// takes on its role.
    pub fn frame_prompt(&self, personality: &Personality, message: &str) -> String {
        match self.id {
            TechniqueId::Standard => message.to_owned(),
            TechniqueId::ChainOfThought => format!(
                "Let me approach this {} systematically and think through it step by step.\n\n\
                 Question: {message}\n\n\
                 My reasoning process:\n\
                 1. Analyze the core components and requirements\n\
                 2. Consider different approaches and their implications\n\
                 3. Evaluate the best path forward\n\
                 4. Provide a solution with actionable steps",
                personality.domain
            ),
            TechniqueId::FewShot => match personality.example {
                Some(example) => {
                    let preview: String = example
                        .assistant
                        .chars()
                        .take(EXAMPLE_PREVIEW_CHARS)
                        .collect();
                    format!(
                        "Here is an example of how I approach similar questions:\n\
                         User: \"{}\"\n\
                         My response: \"{preview}...\"\n\n\
                         Now, applying the same approach to your question:\n\"{message}\"",
                        example.user
                    )
                }
                None => format!("{}Your question: {message}", self.prefix),
            },
            TechniqueId::RolePlaying => format!(
                "I'm taking on the role of {} to give you the most relevant and practical advice.\n\n\
                 In this role, when faced with your question: \"{message}\"\n\n\
                 Here's how I would approach this from my professional perspective:",
                personality.role
            ),
            TechniqueId::StepByStep | TechniqueId::Socratic | TechniqueId::Analogical => {
                format!("{}Question: {message}", self.prefix)
            }
        }
    }
}
