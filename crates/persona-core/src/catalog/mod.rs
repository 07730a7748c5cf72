//! Static response catalog.
//!
//! Both tables are built once at startup and never mutated afterwards, so a
//! [`Catalog`] is shared behind an `Arc` without any locking.

pub mod personality;
pub mod technique;

pub use personality::{FewShotExample, Personality, PersonalityId, ResponseRule};
pub use technique::{Technique, TechniqueId};

use strum::IntoEnumIterator;

/// The full set of personalities and techniques known to the process.
#[derive(Debug, Clone)]
pub struct Catalog {
    personalities: Vec<Personality>,
    techniques: Vec<Technique>,
}

impl Catalog {
    /// Build the built-in catalog.
    pub fn builtin() -> Self {
        Self {
            personalities: PersonalityId::iter().map(Personality::builtin).collect(),
            techniques: TechniqueId::iter().map(Technique::builtin).collect(),
        }
    }

    pub fn personality(&self, id: PersonalityId) -> &Personality {
        // Every variant is present: `builtin` iterates the whole enum.
        &self.personalities[id as usize]
    }

    pub fn technique(&self, id: TechniqueId) -> &Technique {
        &self.techniques[id as usize]
    }

    pub fn personalities(&self) -> &[Personality] {
        &self.personalities
    }

    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    /// Deterministic keyword response: technique prefix followed by the body
    /// of the first matching rule, or by the personality's fallback.
    pub fn keyword_response(
        &self,
        personality: PersonalityId,
        technique: TechniqueId,
        message: &str,
    ) -> String {
        let body = self.personality(personality).select(message);
        let prefix = self.technique(technique).prefix;
        let mut out = String::with_capacity(prefix.len() + body.len());
        out.push_str(prefix);
        out.push_str(body);
        out
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn catalog_index_matches_enum_discriminant() {
        let catalog = Catalog::builtin();
        for id in PersonalityId::iter() {
            assert_eq!(catalog.personality(id).id, id);
        }
        for id in TechniqueId::iter() {
            assert_eq!(catalog.technique(id).id, id);
        }
    }

    #[test]
    fn memory_leak_standard_has_no_prefix() {
        let catalog = Catalog::builtin();
        let memory = catalog
            .personality(PersonalityId::TechnicalExpert)
            .rules
            .iter()
            .find(|r| r.keyword == "memory")
            .map(|r| r.body)
            .unwrap();

        let reply = catalog.keyword_response(
            PersonalityId::TechnicalExpert,
            TechniqueId::Standard,
            "my app has a memory leak",
        );
        assert_eq!(reply, memory);
    }

    #[test]
    fn memory_leak_chain_of_thought_is_prefixed() {
        let catalog = Catalog::builtin();
        let standard = catalog.keyword_response(
            PersonalityId::TechnicalExpert,
            TechniqueId::Standard,
            "my app has a memory leak",
        );
        let cot = catalog.keyword_response(
            PersonalityId::TechnicalExpert,
            TechniqueId::ChainOfThought,
            "my app has a memory leak",
        );
        let prefix = catalog.technique(TechniqueId::ChainOfThought).prefix;
        assert!(!prefix.is_empty());
        assert_eq!(cot, format!("{prefix}{standard}"));
    }

    #[test]
    fn keyword_match_is_deterministic_for_every_technique() {
        let catalog = Catalog::builtin();
        for personality in catalog.personalities() {
            let rule = &personality.rules[0];
            let message = format!("Tell me about {}", rule.keyword.to_uppercase());
            for technique in catalog.techniques() {
                let reply = catalog.keyword_response(personality.id, technique.id, &message);
                assert!(reply.starts_with(technique.prefix));
                assert_eq!(&reply[technique.prefix.len()..], rule.body);
            }
        }
    }

    #[test]
    fn unknown_topic_yields_fallback() {
        let catalog = Catalog::builtin();
        for personality in catalog.personalities() {
            let reply =
                catalog.keyword_response(personality.id, TechniqueId::Standard, "zzz qqq xyz");
            assert_eq!(reply, personality.fallback);
        }
    }
}
