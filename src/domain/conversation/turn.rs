//! Conversation turn value objects.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Role of the turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Synthetic instructions (regenerated, never remembered).
    System,
    /// The human participant.
    User,
    /// The assistant.
    Assistant,
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: Timestamp,
}

impl Turn {
    /// Creates a new turn with the current timestamp.
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Timestamp::now(),
        }
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    /// Creates a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content)
    }

    /// Returns true for user turns.
    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }

    /// Returns true for assistant turns.
    pub fn is_assistant(&self) -> bool {
        self.role == TurnRole::Assistant
    }
}

/// Returns the latest user turn, ignoring trailing assistant/system turns.
pub fn latest_user_turn(turns: &[Turn]) -> Option<&Turn> {
    turns.iter().rev().find(|t| t.is_user())
}

/// Returns the assistant turn that immediately precedes the final user turn,
/// if the transcript ends with user speech.
pub fn assistant_turn_before_last_user(turns: &[Turn]) -> Option<&Turn> {
    let last = turns.last()?;
    if !last.is_user() {
        return None;
    }
    turns[..turns.len() - 1].iter().rev().find(|t| t.is_assistant())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TurnRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&TurnRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn latest_user_turn_skips_trailing_assistant() {
        let turns = vec![
            Turn::user("first"),
            Turn::assistant("reply"),
            Turn::user("second"),
            Turn::assistant("trailing"),
        ];
        assert_eq!(latest_user_turn(&turns).unwrap().content, "second");
    }

    #[test]
    fn latest_user_turn_none_for_empty() {
        assert!(latest_user_turn(&[]).is_none());
    }

    #[test]
    fn assistant_before_last_user_requires_user_tail() {
        let turns = vec![Turn::user("hi"), Turn::assistant("hello")];
        assert!(assistant_turn_before_last_user(&turns).is_none());

        let turns = vec![
            Turn::user("hi"),
            Turn::assistant("want a goal?"),
            Turn::user("yes"),
        ];
        assert_eq!(
            assistant_turn_before_last_user(&turns).unwrap().content,
            "want a goal?"
        );
    }
}
