//! Prompt formatting and output cleanup for the local model path.

use crate::catalog::{Personality, Technique};
use crate::session::{Role, Turn};

/// Model output shorter than this (in characters, after cleanup) is
/// discarded in favour of the keyword response.
pub const MIN_RESPONSE_CHARS: usize = 10;

const STOP_MARKERS: [&str; 3] = ["\nUser:", "\nSystem:", "\nAssistant:"];

/// Build the single prompt string fed to the model.
///
/// The format is a simple `Role: content` transcript ending with an
/// `Assistant:` cue.
pub fn format_prompt(
    personality: &Personality,
    technique: &Technique,
    history: &[Turn],
    message: &str,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(history.len() + 3);
    parts.push(format!("System: {}", personality.system_prompt));
    for turn in history {
        parts.push(format!("{}: {}", role_label(turn.role), turn.content));
    }
    parts.push(format!("User: {}", technique.frame_prompt(personality, message)));
    parts.push("Assistant:".into());
    parts.join("\n")
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
    }
}

/// Trim whitespace and cut the text where the model starts writing the next
/// speaker's line.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw;
    for marker in STOP_MARKERS {
        if let Some(idx) = text.find(marker) {
            text = &text[..idx];
        }
    }
    text.trim().to_owned()
}

/// The trailing `max` tokens of `tokens`.
///
/// Keeping the tail preserves the latest message and the `Assistant:` cue.
pub fn tail_window<T>(tokens: &[T], max: usize) -> &[T] {
    &tokens[tokens.len().saturating_sub(max)..]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::{PersonalityId, TechniqueId};
    use crate::generation::ResponseSource;
    use chrono::Utc;

    #[test]
    fn prompt_contains_history_and_cue() {
        let p = Personality::builtin(PersonalityId::TechnicalExpert);
        let t = Technique::builtin(TechniqueId::Standard);
        let now = Utc::now();
        let history = vec![
            Turn::user("first", TechniqueId::Standard, now),
            Turn::assistant(
                "reply",
                PersonalityId::TechnicalExpert,
                0.0,
                ResponseSource::Keyword,
                now,
            ),
        ];
        let prompt = format_prompt(&p, &t, &history, "second");
        let lines: Vec<&str> = prompt.lines().collect();
        assert!(lines[0].starts_with("System: "));
        assert_eq!(lines[1], "User: first");
        assert_eq!(lines[2], "Assistant: reply");
        assert_eq!(lines[3], "User: second");
        assert_eq!(*lines.last().unwrap(), "Assistant:");
    }

    #[test]
    fn clean_cuts_at_next_speaker() {
        let cleaned = clean_response("  Use a profiler first.\nUser: thanks\nAssistant: np");
        assert_eq!(cleaned, "Use a profiler first.");
    }

    #[test]
    fn tail_window_keeps_the_end() {
        let tokens = [1, 2, 3, 4, 5];
        assert_eq!(tail_window(&tokens, 2), &[4, 5]);
        assert_eq!(tail_window(&tokens, 10), &tokens);
    }
}
