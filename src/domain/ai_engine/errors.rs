//! Engine error taxonomy.
//!
//! Errors here are internal to the pipeline: every component boundary maps
//! them to a degraded conversational response, so none of these ever reach
//! the caller as a raw payload.

use thiserror::Error;

use crate::ports::{AiError, PersistenceError};

/// Failures inside the orchestration pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Classifier output was malformed or the gateway failed. Recoverable:
    /// routing degrades to general chat.
    #[error("intent classification failed: {0}")]
    Classification(String),

    /// Entity extraction output was unparsable. Recoverable: the specialist
    /// re-asks the user.
    #[error("entity extraction failed: {0}")]
    Extraction(String),

    /// Neither clearly yes nor no. The specialist re-presents the draft
    /// without advancing state.
    #[error("confirmation was ambiguous")]
    ConfirmationAmbiguous,

    /// Both executor tiers failed. Terminal for this action; surfaced to the
    /// user as plain language.
    #[error("action execution failed: {0}")]
    ActionExecution(String),

    /// Gateway transport failure (timeout/network). Treated like the
    /// call-site's recoverable error.
    #[error(transparent)]
    Gateway(#[from] AiError),
}

impl From<PersistenceError> for EngineError {
    fn from(err: PersistenceError) -> Self {
        Self::ActionExecution(err.to_string())
    }
}
