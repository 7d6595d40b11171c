//! Centralized confirmation detection.
//!
//! All specialists share this single detector instead of scattering string
//! heuristics per flow. A bare affirmative ("yes", "sure") only counts as a
//! confirmation when the immediately preceding assistant turn both asked a
//! question and referenced the domain (the word "goal"/"task" or the draft
//! entity's title). A stray "yes" in unrelated conversation is ordinary chat.

use once_cell::sync::Lazy;

use super::turn::{assistant_turn_before_last_user, latest_user_turn, Turn};

/// Outcome of literal confirmation detection over a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationSignal {
    /// The user clearly agreed.
    Confirmed,
    /// The user clearly declined or asked for changes.
    Denied,
    /// Neither clearly yes nor no; the caller should re-present and re-ask
    /// (or consult the semantic path).
    Ambiguous,
}

/// Affirmative phrases accepted as a whole reply.
static AFFIRMATIVES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "yes", "yeah", "yep", "sure", "ok", "okay", "correct", "right", "good", "great",
        "perfect", "sounds good", "looks good", "add it", "do it", "please do", "go ahead",
    ]
});

/// Negative phrases accepted as a whole reply or a leading word.
static NEGATIVES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec!["no", "nope", "not yet", "not quite", "cancel", "never mind", "nevermind"]
});

/// Cues that the assistant was asking the user a question.
static QUESTION_CUES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "does this look right",
        "look good",
        "would you like",
        "want to",
        "like me to",
        "should i add",
        "shall i",
    ]
});

/// Normalizes a reply: lowercase, trimmed, trailing punctuation stripped.
fn normalize(reply: &str) -> String {
    reply
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_lowercase()
}

/// Returns true when the reply is a bare affirmative phrase.
pub fn is_bare_affirmative(reply: &str) -> bool {
    let normalized = normalize(reply);
    AFFIRMATIVES.iter().any(|phrase| normalized == *phrase)
}

/// Returns true when the reply is a clear negative.
pub fn is_negative(reply: &str) -> bool {
    let normalized = normalize(reply);
    NEGATIVES.iter().any(|phrase| {
        normalized == *phrase || normalized.starts_with(&format!("{phrase} "))
    })
}

/// Returns true when the assistant turn contains a question cue.
pub fn has_question_cue(assistant_content: &str) -> bool {
    let lowered = assistant_content.to_lowercase();
    QUESTION_CUES.iter().any(|cue| lowered.contains(cue))
}

/// Returns true when the assistant turn references the domain: the given
/// domain word ("goal"/"task") or a previously-extracted entity title.
pub fn has_domain_cue(assistant_content: &str, domain_word: &str, draft_title: Option<&str>) -> bool {
    let lowered = assistant_content.to_lowercase();
    if lowered.contains(&domain_word.to_lowercase()) {
        return true;
    }
    draft_title
        .map(|title| !title.is_empty() && lowered.contains(&title.to_lowercase()))
        .unwrap_or(false)
}

/// Detects whether the latest user turn confirms a pending draft.
///
/// `domain_word` anchors the domain cue ("goal" or "task"); `draft_title` is
/// the entity title extracted so far, if any.
pub fn detect_confirmation(
    turns: &[Turn],
    domain_word: &str,
    draft_title: Option<&str>,
) -> ConfirmationSignal {
    let Some(user_turn) = latest_user_turn(turns) else {
        return ConfirmationSignal::Ambiguous;
    };

    if is_negative(&user_turn.content) {
        return ConfirmationSignal::Denied;
    }

    if is_bare_affirmative(&user_turn.content) {
        // Bare affirmatives require both cues on the preceding assistant turn.
        let confirmed = assistant_turn_before_last_user(turns)
            .map(|assistant| {
                has_question_cue(&assistant.content)
                    && has_domain_cue(&assistant.content, domain_word, draft_title)
            })
            .unwrap_or(false);
        return if confirmed {
            ConfirmationSignal::Confirmed
        } else {
            ConfirmationSignal::Ambiguous
        };
    }

    ConfirmationSignal::Ambiguous
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirm_prompt() -> Turn {
        Turn::assistant(
            "Got it! Adding this goal:\n- Goal: Bench press 225 lbs\n- Category: health\n- Due: 2025-12-31\n\nDoes this look right?",
        )
    }

    #[test]
    fn bare_yes_after_goal_question_confirms() {
        let turns = vec![Turn::user("I want to bench 225"), confirm_prompt(), Turn::user("yes")];
        assert_eq!(
            detect_confirmation(&turns, "goal", Some("Bench press 225 lbs")),
            ConfirmationSignal::Confirmed
        );
    }

    #[test]
    fn trailing_punctuation_and_case_are_ignored() {
        let turns = vec![confirm_prompt(), Turn::user("Yes!")];
        assert_eq!(
            detect_confirmation(&turns, "goal", None),
            ConfirmationSignal::Confirmed
        );
    }

    #[test]
    fn stray_yes_without_question_is_ambiguous() {
        let turns = vec![
            Turn::user("how was your day"),
            Turn::assistant("Pretty good! The weather here is always sunny."),
            Turn::user("yes"),
        ];
        assert_eq!(
            detect_confirmation(&turns, "goal", None),
            ConfirmationSignal::Ambiguous
        );
    }

    #[test]
    fn question_without_domain_cue_is_ambiguous() {
        let turns = vec![
            Turn::assistant("Would you like to hear a joke?"),
            Turn::user("sure"),
        ];
        assert_eq!(
            detect_confirmation(&turns, "goal", None),
            ConfirmationSignal::Ambiguous
        );
    }

    #[test]
    fn draft_title_serves_as_domain_cue() {
        let turns = vec![
            Turn::assistant("Bench press 225 lbs by December - should I add that? Does this look right?"),
            Turn::user("yes"),
        ];
        assert_eq!(
            detect_confirmation(&turns, "objective", Some("Bench press 225 lbs")),
            ConfirmationSignal::Confirmed
        );
    }

    #[test]
    fn clear_negative_is_denied() {
        let turns = vec![confirm_prompt(), Turn::user("no, make it 250 lbs")];
        assert_eq!(
            detect_confirmation(&turns, "goal", None),
            ConfirmationSignal::Denied
        );
    }

    #[test]
    fn free_text_is_ambiguous() {
        let turns = vec![confirm_prompt(), Turn::user("hmm let me think about it")];
        assert_eq!(
            detect_confirmation(&turns, "goal", None),
            ConfirmationSignal::Ambiguous
        );
    }

    #[test]
    fn yes_as_first_turn_is_ambiguous() {
        let turns = vec![Turn::user("yes")];
        assert_eq!(
            detect_confirmation(&turns, "goal", None),
            ConfirmationSignal::Ambiguous
        );
    }

    #[test]
    fn negative_word_inside_sentence_is_not_denied() {
        // "I know" contains "no" as a substring but is not a denial
        assert!(!is_negative("I know"));
        assert!(is_negative("no"));
        assert!(is_negative("not yet, change the date"));
    }
}
