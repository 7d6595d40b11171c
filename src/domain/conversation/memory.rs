//! Bounded per-conversation memory window.
//!
//! Keeps the most recent turns of one conversation and renders them into a
//! single synthetic system turn that downstream model calls use as context
//! without unbounded token growth. System turns are regenerated each call,
//! never remembered.

use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;

use crate::domain::foundation::ConversationId;

use super::turn::{Turn, TurnRole};

/// Default number of turns kept per conversation.
pub const DEFAULT_MEMORY_CAPACITY: usize = 10;

/// Maximum characters of each remembered turn rendered into the context turn.
const CONTEXT_SNIPPET_CHARS: usize = 100;

/// A capacity-bounded rolling window of conversation turns.
///
/// Insertion order is preserved; the oldest turn is evicted first. Updating
/// never fails.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    capacity: usize,
    window: VecDeque<Turn>,
}

impl ConversationMemory {
    /// Creates an empty window with the given capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            window: VecDeque::new(),
        }
    }

    /// Appends turns, filtering out system turns and evicting the oldest
    /// entries beyond capacity.
    pub fn update(&mut self, turns: &[Turn]) {
        for turn in turns {
            if turn.role == TurnRole::System {
                continue;
            }
            self.window.push_back(turn.clone());
            while self.window.len() > self.capacity {
                self.window.pop_front();
            }
        }
    }

    /// Number of remembered turns.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns true when nothing is remembered yet.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Snapshot of the remembered turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.window.iter().cloned().collect()
    }

    /// Renders the window into one synthetic system turn, or `None` when the
    /// window is empty. Each turn's content is truncated to keep the context
    /// bounded.
    pub fn context_turn(&self) -> Option<Turn> {
        if self.window.is_empty() {
            return None;
        }

        let mut body = String::from("Recent conversation context:\n");
        for turn in &self.window {
            let label = match turn.role {
                TurnRole::User => "USER",
                TurnRole::Assistant => "ASSISTANT",
                TurnRole::System => continue,
            };
            body.push_str(label);
            body.push_str(": ");
            body.push_str(&truncate_chars(&turn.content, CONTEXT_SNIPPET_CHARS));
            body.push('\n');
        }
        body.push_str("\nRemember this conversation context when responding to the user.");

        Some(Turn::system(body))
    }
}

/// Truncates on a character boundary, appending an ellipsis when shortened.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}...")
}

/// Per-conversation memory windows, keyed and isolated by conversation id.
///
/// Owned by the orchestration entry point rather than a process-wide
/// singleton, so independent conversations never share mutable state.
#[derive(Debug)]
pub struct MemoryRegistry {
    capacity: usize,
    inner: Mutex<HashMap<ConversationId, ConversationMemory>>,
}

impl MemoryRegistry {
    /// Creates a registry whose windows use the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Appends turns to one conversation's window.
    pub async fn update(&self, id: ConversationId, turns: &[Turn]) {
        let mut map = self.inner.lock().await;
        map.entry(id)
            .or_insert_with(|| ConversationMemory::with_capacity(self.capacity))
            .update(turns);
    }

    /// Snapshot of one conversation's window, oldest first.
    pub async fn snapshot(&self, id: ConversationId) -> Vec<Turn> {
        let map = self.inner.lock().await;
        map.get(&id).map(|m| m.snapshot()).unwrap_or_default()
    }

    /// Context turn for one conversation, if any turns are remembered.
    pub async fn context_turn(&self, id: ConversationId) -> Option<Turn> {
        let map = self.inner.lock().await;
        map.get(&id).and_then(|m| m.context_turn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_filters_system_turns() {
        let mut memory = ConversationMemory::with_capacity(5);
        memory.update(&[
            Turn::system("instructions"),
            Turn::user("hello"),
            Turn::assistant("hi there"),
        ]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn oldest_turn_evicted_at_capacity() {
        let mut memory = ConversationMemory::with_capacity(3);
        for i in 0..5 {
            memory.update(&[Turn::user(format!("message {i}"))]);
        }
        assert_eq!(memory.len(), 3);
        let snapshot = memory.snapshot();
        assert_eq!(snapshot[0].content, "message 2");
        assert_eq!(snapshot[2].content, "message 4");
    }

    #[test]
    fn context_turn_is_none_when_empty() {
        let memory = ConversationMemory::with_capacity(5);
        assert!(memory.context_turn().is_none());
    }

    #[test]
    fn context_turn_truncates_long_content() {
        let mut memory = ConversationMemory::with_capacity(5);
        memory.update(&[Turn::user("x".repeat(300))]);
        let context = memory.context_turn().unwrap();
        assert_eq!(context.role, TurnRole::System);
        assert!(context.content.contains(&"x".repeat(100)));
        assert!(!context.content.contains(&"x".repeat(101)));
        assert!(context.content.contains("..."));
    }

    #[test]
    fn context_turn_handles_multibyte_content() {
        let mut memory = ConversationMemory::with_capacity(5);
        memory.update(&[Turn::user("é".repeat(150))]);
        // Must not panic on a non-ASCII boundary
        let context = memory.context_turn().unwrap();
        assert!(context.content.contains("..."));
    }

    #[test]
    fn capacity_zero_clamps_to_one() {
        let mut memory = ConversationMemory::with_capacity(0);
        memory.update(&[Turn::user("a"), Turn::user("b")]);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.snapshot()[0].content, "b");
    }

    #[tokio::test]
    async fn registry_isolates_conversations() {
        let registry = MemoryRegistry::new(5);
        let a = ConversationId::new();
        let b = ConversationId::new();

        registry.update(a, &[Turn::user("for a")]).await;
        registry.update(b, &[Turn::user("for b")]).await;

        let snap_a = registry.snapshot(a).await;
        let snap_b = registry.snapshot(b).await;
        assert_eq!(snap_a.len(), 1);
        assert_eq!(snap_a[0].content, "for a");
        assert_eq!(snap_b[0].content, "for b");
    }

    #[tokio::test]
    async fn registry_unknown_conversation_is_empty() {
        let registry = MemoryRegistry::new(5);
        assert!(registry.snapshot(ConversationId::new()).await.is_empty());
        assert!(registry.context_turn(ConversationId::new()).await.is_none());
    }
}
