//! Goal specialist: slot-filling flow from free text to a persisted goal.
//!
//! State is derived from the transcript on every call, never cached. The
//! assistant's own replies carry the markers the derivation reads back:
//! summary lines for the draft, a confirmation question, a success
//! acknowledgement. Re-deriving from the same transcript always yields the
//! same state, and a finished flow (acknowledgement present) leaves no open
//! draft to confirm twice.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::conversation::{
    assistant_turn_before_last_user, detect_confirmation, latest_user_turn, ConfirmationSignal,
    Turn,
};
use crate::domain::goal::{GoalDraft, GoalField};

use super::super::errors::EngineError;
use super::super::executor::{Action, ActionExecutor};
use super::super::extraction::EntityExtractor;
use super::super::specialist::{Specialist, SpecialistReply, TurnContext};
use super::super::values::{CreatedEntity, Domain};

const SUMMARY_TITLE: &str = "- Goal: ";
const SUMMARY_CATEGORY: &str = "- Category: ";
const SUMMARY_DUE: &str = "- Due: ";
const CONFIRM_QUESTION: &str = "Does this look right?";
const ACK_MARKER: &str = "I've added your goal";
const REFINE_QUESTION: &str = "What would you like to change about this goal?";

const GOAL_KEYWORDS: &[&str] = &[
    "goal",
    "objective",
    "i want to",
    "i'd like to",
    "achieve",
    "aim to",
    "aspire",
    "resolution",
];

/// Flow position derived from the transcript.
#[derive(Debug, Clone, PartialEq)]
enum GoalFlowState {
    /// No open draft; a fresh request starts extraction.
    Inquiry,
    /// Draft under construction; the assistant last asked for a field or a
    /// change.
    Collecting(GoalDraft),
    /// Complete draft presented; awaiting the user's yes or no.
    Confirming(GoalDraft),
}

/// Specialist for goal creation.
pub struct GoalSpecialist {
    extractor: Arc<EntityExtractor>,
    executor: Arc<ActionExecutor>,
    confirmation_threshold: f64,
}

impl GoalSpecialist {
    pub fn new(
        extractor: Arc<EntityExtractor>,
        executor: Arc<ActionExecutor>,
        confirmation_threshold: f64,
    ) -> Self {
        Self {
            extractor,
            executor,
            confirmation_threshold,
        }
    }

    /// Derives the flow state by scanning assistant turns newest-first for
    /// flow markers. A success acknowledgement closes the flow outright.
    fn derive_state(turns: &[Turn]) -> GoalFlowState {
        let mut pending_draft_needed = false;
        for turn in turns.iter().rev().filter(|t| t.is_assistant()) {
            if pending_draft_needed {
                if let Some(draft) = parse_summary(&turn.content) {
                    return GoalFlowState::Collecting(draft);
                }
                if turn.content.contains(ACK_MARKER) {
                    return GoalFlowState::Inquiry;
                }
                continue;
            }

            if turn.content.contains(ACK_MARKER) {
                return GoalFlowState::Inquiry;
            }
            if turn.content.contains(CONFIRM_QUESTION) {
                if let Some(draft) = parse_summary(&turn.content) {
                    return GoalFlowState::Confirming(draft);
                }
                return GoalFlowState::Inquiry;
            }
            if turn.content.contains(REFINE_QUESTION) || asks_goal_slot(&turn.content) {
                // The draft lives in an earlier summary, if one exists.
                if let Some(draft) = parse_summary(&turn.content) {
                    return GoalFlowState::Collecting(draft);
                }
                pending_draft_needed = true;
            }
        }
        if pending_draft_needed {
            return GoalFlowState::Collecting(GoalDraft::default());
        }
        GoalFlowState::Inquiry
    }

    /// Renders the next reply for a draft: confirm when complete, otherwise
    /// ask for exactly one missing field.
    fn present(draft: &GoalDraft) -> String {
        let missing = draft.missing_fields();
        match missing.first() {
            None => format!(
                "Got it! Here's your goal:\n{}\n\n{CONFIRM_QUESTION}",
                summary_block(draft)
            ),
            Some(field) => {
                if draft.title.is_some() {
                    format!(
                        "Here's what I have so far:\n{}\n\n{}",
                        summary_block(draft),
                        field.prompt()
                    )
                } else {
                    format!("I'd love to help you set a goal. {}", field.prompt())
                }
            }
        }
    }

    /// Runs extraction on the latest user turn, merges into the draft, and
    /// replies with either the confirmation prompt or one follow-up
    /// question. Extraction failure re-asks instead of aborting.
    async fn collect(
        &self,
        ctx: &TurnContext,
        mut draft: GoalDraft,
    ) -> Result<SpecialistReply, EngineError> {
        let Some(user_turn) = latest_user_turn(&ctx.turns) else {
            return Ok(SpecialistReply::text(Self::present(&draft)));
        };

        match self
            .extractor
            .extract_goal(ctx.context_turn.as_ref(), &user_turn.content)
            .await
        {
            Ok(extracted) => draft.merge(extracted),
            Err(err) => {
                warn!(error = %err, "goal extraction failed, re-asking");
                let field = draft.missing_fields().into_iter().next().unwrap_or(GoalField::Title);
                return Ok(SpecialistReply::text(format!(
                    "Sorry, I didn't quite catch that. {}",
                    field.prompt()
                )));
            }
        }
        Ok(SpecialistReply::text(Self::present(&draft)))
    }

    /// Persists a confirmed draft and acknowledges, or surfaces the failure
    /// conversationally and leaves the flow open for another attempt.
    async fn persist(&self, draft: GoalDraft, ctx: &TurnContext) -> SpecialistReply {
        let title = draft.title.clone().unwrap_or_default();
        let result = self.executor.execute(Action::CreateGoal(draft), &ctx.owner).await;
        match result.entity {
            Some(entity) => {
                let id = match &entity {
                    CreatedEntity::Goal { id, .. } => id.to_string(),
                    CreatedEntity::Task { id, .. } => id.to_string(),
                };
                SpecialistReply::with_entity(
                    format!(
                        "{ACK_MARKER} \"{title}\" (id: {id})! Would you like me to suggest some first tasks for it?"
                    ),
                    entity,
                )
            }
            None => {
                warn!(error = ?result.error, "goal persist failed, staying in flow");
                SpecialistReply::text(
                    "I'm sorry, I ran into a problem saving that goal. Give me another \"yes\" in a moment and I'll try again.",
                )
            }
        }
    }
}

#[async_trait]
impl Specialist for GoalSpecialist {
    fn name(&self) -> &'static str {
        "goal_specialist"
    }

    fn domain_affinity(&self) -> Domain {
        Domain::GoalSetting
    }

    fn can_handle(&self, turns: &[Turn]) -> bool {
        let Some(user_turn) = latest_user_turn(turns) else {
            return false;
        };
        let content = user_turn.content.to_lowercase();
        if GOAL_KEYWORDS.iter().any(|k| content.contains(k)) {
            return true;
        }
        // Mid-flow short replies ("yes", "health", "by December") carry no
        // keyword but still belong to an open flow.
        Self::derive_state(turns) != GoalFlowState::Inquiry
    }

    async fn confidence(&self, turns: &[Turn]) -> f64 {
        let Some(user_turn) = latest_user_turn(turns) else {
            return 0.0;
        };
        let content = user_turn.content.to_lowercase();

        // Explicit goal language, or commitment phrasing with a measurable
        // target or horizon ("I want to bench press 225 lbs by end of
        // year"), outranks topical specialists like fitness.
        if content.contains("goal") || content.contains("objective") {
            return 0.95;
        }
        let commits = ["i want to", "i'd like to", "aim to", "aspire"]
            .iter()
            .any(|k| content.contains(k));
        let measurable =
            content.chars().any(|c| c.is_ascii_digit()) || content.contains(" by ");
        if commits && measurable {
            return 0.95;
        }
        if Self::derive_state(turns) != GoalFlowState::Inquiry {
            return 0.9;
        }
        if GOAL_KEYWORDS.iter().any(|k| content.contains(k)) {
            return 0.7;
        }
        0.1
    }

    async fn handle(&self, ctx: &TurnContext) -> Result<SpecialistReply, EngineError> {
        let state = Self::derive_state(&ctx.turns);
        let state_name = match &state {
            GoalFlowState::Inquiry => "inquiry",
            GoalFlowState::Collecting(_) => "collecting",
            GoalFlowState::Confirming(_) => "confirming",
        };
        debug!(state = state_name, "goal flow state derived");

        match state {
            GoalFlowState::Inquiry => self.collect(ctx, GoalDraft::default()).await,
            GoalFlowState::Collecting(draft) => self.collect(ctx, draft).await,
            GoalFlowState::Confirming(draft) => {
                let signal =
                    detect_confirmation(&ctx.turns, "goal", draft.title.as_deref());
                match signal {
                    ConfirmationSignal::Confirmed => Ok(self.persist(draft, ctx).await),
                    ConfirmationSignal::Denied => Ok(SpecialistReply::text(format!(
                        "No problem. {REFINE_QUESTION}"
                    ))),
                    ConfirmationSignal::Ambiguous => {
                        // Literal detection was inconclusive: try the
                        // semantic path before treating the reply as a
                        // correction.
                        let question = assistant_turn_before_last_user(&ctx.turns)
                            .map(|t| t.content.clone())
                            .unwrap_or_default();
                        let reply = latest_user_turn(&ctx.turns)
                            .map(|t| t.content.clone())
                            .unwrap_or_default();
                        let confirmed = self
                            .extractor
                            .semantic_confirmation(&question, &reply, self.confirmation_threshold)
                            .await
                            .unwrap_or(false);
                        if confirmed {
                            Ok(self.persist(draft, ctx).await)
                        } else {
                            // Treat the reply as a correction, merge it in,
                            // and re-present.
                            self.collect(ctx, draft).await
                        }
                    }
                }
            }
        }
    }
}

/// Renders the summary block the state derivation parses back.
fn summary_block(draft: &GoalDraft) -> String {
    let mut lines = Vec::new();
    if let Some(title) = draft.title.as_deref() {
        lines.push(format!("{SUMMARY_TITLE}{title}"));
    }
    if draft.category.is_some() {
        lines.push(format!("{SUMMARY_CATEGORY}{}", draft.parsed_category().as_str()));
    }
    if let Some(deadline) = draft.deadline.as_deref() {
        lines.push(format!("{SUMMARY_DUE}{deadline}"));
    }
    lines.join("\n")
}

/// Parses a draft back out of an assistant summary block.
fn parse_summary(content: &str) -> Option<GoalDraft> {
    let mut draft = GoalDraft::default();
    for line in content.lines() {
        let line = line.trim();
        if let Some(title) = line.strip_prefix(SUMMARY_TITLE) {
            draft.title = Some(title.to_string());
        } else if let Some(category) = line.strip_prefix(SUMMARY_CATEGORY) {
            draft.category = Some(category.to_string());
        } else if let Some(due) = line.strip_prefix(SUMMARY_DUE) {
            draft.deadline = Some(due.to_string());
        }
    }
    draft.title.is_some().then_some(draft)
}

/// True when the assistant content asks for one of the goal slots.
fn asks_goal_slot(content: &str) -> bool {
    [GoalField::Title, GoalField::Category, GoalField::Deadline]
        .iter()
        .any(|f| content.contains(f.prompt()))
}
