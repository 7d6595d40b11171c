//! ProcessTurnHandler - command handler for one inbound conversation turn.

use std::sync::Arc;

use crate::domain::ai_engine::{ConversationEngine, CreatedEntity};
use crate::domain::conversation::Turn;
use crate::domain::foundation::{ConversationId, UserId};

/// Command to process one user turn.
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    pub conversation_id: ConversationId,
    pub owner: UserId,
    pub content: String,
}

/// Result of processing a turn.
#[derive(Debug, Clone)]
pub struct ProcessTurnResult {
    pub assistant_turn: Turn,
    /// Which handler produced the reply, for observability and UI hints.
    pub handler: String,
    /// Entity created during the turn, if any ("goal created" banners).
    pub entity: Option<CreatedEntity>,
}

/// Handler wrapping the conversation engine.
pub struct ProcessTurnHandler {
    engine: Arc<ConversationEngine>,
}

impl ProcessTurnHandler {
    pub fn new(engine: Arc<ConversationEngine>) -> Self {
        Self { engine }
    }

    /// Processes the turn. Infallible by design: pipeline failures surface
    /// as conversational text inside the result.
    pub async fn handle(&self, cmd: ProcessTurnCommand) -> ProcessTurnResult {
        let outcome = self
            .engine
            .process_turn(cmd.conversation_id, &cmd.owner, Turn::user(cmd.content))
            .await;

        ProcessTurnResult {
            assistant_turn: outcome.assistant_turn,
            handler: outcome.handler,
            entity: outcome.entity,
        }
    }
}
