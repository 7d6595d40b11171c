//! Specialist contract.

use async_trait::async_trait;

use crate::domain::conversation::Turn;
use crate::domain::foundation::UserId;

use super::errors::EngineError;
use super::values::{CreatedEntity, Domain};

/// Everything a specialist sees when handling one turn: a consistent
/// snapshot of the conversation, the rendered context turn that model calls
/// carry, and the owner on whose behalf it acts.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub turns: Vec<Turn>,
    /// Synthetic system turn summarizing the recent window, when non-empty.
    pub context_turn: Option<Turn>,
    pub owner: UserId,
}

/// A specialist's reply for one turn.
#[derive(Debug, Clone)]
pub struct SpecialistReply {
    pub content: String,
    /// Entity persisted while handling this turn, if any.
    pub entity: Option<CreatedEntity>,
}

impl SpecialistReply {
    /// A plain text reply with no side effects.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            entity: None,
        }
    }

    /// A reply accompanying a persisted entity.
    pub fn with_entity(content: impl Into<String>, entity: CreatedEntity) -> Self {
        Self {
            content: content.into(),
            entity: Some(entity),
        }
    }
}

/// A domain handler with its own state machine and confidence function.
///
/// `can_handle` is a cheap keyword/state prefilter; `confidence` may be more
/// expensive. `handle` derives its state from the turn snapshot alone, so
/// re-deriving from the same transcript always lands in the same state.
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Stable handler name, reported in turn outcomes.
    fn name(&self) -> &'static str;

    /// The classified domain this specialist prefers.
    fn domain_affinity(&self) -> Domain;

    /// Cheap prefilter: keywords or open-flow detection. Checked even when
    /// the classified domain disagrees, because a mid-flow confirmation like
    /// "yes" carries no domain keyword.
    fn can_handle(&self, turns: &[Turn]) -> bool;

    /// Handling-confidence score in 0..=1 for the current turn.
    async fn confidence(&self, turns: &[Turn]) -> f64;

    /// Produces the reply for this turn, possibly persisting an entity.
    async fn handle(&self, ctx: &TurnContext) -> Result<SpecialistReply, EngineError>;
}
