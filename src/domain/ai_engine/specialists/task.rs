//! Task specialist: the shorter slot-filling flow for tasks.
//!
//! Same transcript-derived state discipline as the goal flow, with a
//! three-stage machine: intent detected, details collected, confirmed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::conversation::{
    assistant_turn_before_last_user, detect_confirmation, latest_user_turn, ConfirmationSignal,
    Turn,
};
use crate::domain::task::{TaskDraft, TaskField};

use super::super::errors::EngineError;
use super::super::executor::{Action, ActionExecutor};
use super::super::extraction::EntityExtractor;
use super::super::specialist::{Specialist, SpecialistReply, TurnContext};
use super::super::values::{CreatedEntity, Domain};

const SUMMARY_TITLE: &str = "- Task: ";
const SUMMARY_DUE: &str = "- Due: ";
const SUMMARY_GOAL: &str = "- For goal: ";
const CONFIRM_QUESTION: &str = "Should I add it?";
const ACK_MARKER: &str = "I've added your task";

const TASK_KEYWORDS: &[&str] = &[
    "task",
    "todo",
    "to-do",
    "remind me",
    "i need to",
    "add a reminder",
    "checklist",
];

#[derive(Debug, Clone, PartialEq)]
enum TaskFlowState {
    IntentDetected,
    DetailsCollected(TaskDraft),
    AwaitingConfirmation(TaskDraft),
}

/// Specialist for task creation.
pub struct TaskSpecialist {
    extractor: Arc<EntityExtractor>,
    executor: Arc<ActionExecutor>,
    confirmation_threshold: f64,
}

impl TaskSpecialist {
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

    fn derive_state(turns: &[Turn]) -> TaskFlowState {
        let mut pending_draft_needed = false;
        for turn in turns.iter().rev().filter(|t| t.is_assistant()) {
            if pending_draft_needed {
                if let Some(draft) = parse_summary(&turn.content) {
                    return TaskFlowState::DetailsCollected(draft);
                }
                if turn.content.contains(ACK_MARKER) {
                    return TaskFlowState::IntentDetected;
                }
                continue;
            }

            if turn.content.contains(ACK_MARKER) {
                return TaskFlowState::IntentDetected;
            }
            if turn.content.contains(CONFIRM_QUESTION) {
                if let Some(draft) = parse_summary(&turn.content) {
                    return TaskFlowState::AwaitingConfirmation(draft);
                }
                return TaskFlowState::IntentDetected;
            }
            if asks_task_slot(&turn.content) {
                if let Some(draft) = parse_summary(&turn.content) {
                    return TaskFlowState::DetailsCollected(draft);
                }
                pending_draft_needed = true;
            }
        }
        if pending_draft_needed {
            return TaskFlowState::DetailsCollected(TaskDraft::default());
        }
        TaskFlowState::IntentDetected
    }

    fn present(draft: &TaskDraft) -> String {
        match draft.missing_fields().first() {
            None => format!(
                "Here's the task:\n{}\n\n{CONFIRM_QUESTION}",
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
                    format!("Happy to help with that. {}", field.prompt())
                }
            }
        }
    }

    async fn collect(
        &self,
        ctx: &TurnContext,
        mut draft: TaskDraft,
    ) -> Result<SpecialistReply, EngineError> {
        let Some(user_turn) = latest_user_turn(&ctx.turns) else {
            return Ok(SpecialistReply::text(Self::present(&draft)));
        };

        match self
            .extractor
            .extract_task(ctx.context_turn.as_ref(), &user_turn.content)
            .await
        {
            Ok(extracted) => draft.merge(extracted),
            Err(err) => {
                warn!(error = %err, "task extraction failed, re-asking");
                let field = draft.missing_fields().into_iter().next().unwrap_or(TaskField::Title);
                return Ok(SpecialistReply::text(format!(
                    "Sorry, I didn't quite catch that. {}",
                    field.prompt()
                )));
            }
        }
        Ok(SpecialistReply::text(Self::present(&draft)))
    }

    async fn persist(&self, draft: TaskDraft, ctx: &TurnContext) -> SpecialistReply {
        let title = draft.title.clone().unwrap_or_default();
        let result = self.executor.execute(Action::CreateTask(draft), &ctx.owner).await;
        match result.entity {
            Some(entity) => {
                let id = match &entity {
                    CreatedEntity::Goal { id, .. } => id.to_string(),
                    CreatedEntity::Task { id, .. } => id.to_string(),
                };
                SpecialistReply::with_entity(
                    format!("{ACK_MARKER} \"{title}\" (id: {id})! I'll keep it on your list."),
                    entity,
                )
            }
            None => {
                warn!(error = ?result.error, "task persist failed, staying in flow");
                SpecialistReply::text(
                    "I'm sorry, I ran into a problem saving that task. Give me another \"yes\" in a moment and I'll try again.",
                )
            }
        }
    }
}

#[async_trait]
impl Specialist for TaskSpecialist {
    fn name(&self) -> &'static str {
        "task_specialist"
    }

    fn domain_affinity(&self) -> Domain {
        Domain::TaskManagement
    }

    fn can_handle(&self, turns: &[Turn]) -> bool {
        let Some(user_turn) = latest_user_turn(turns) else {
            return false;
        };
        let content = user_turn.content.to_lowercase();
        if TASK_KEYWORDS.iter().any(|k| content.contains(k)) {
            return true;
        }
        Self::derive_state(turns) != TaskFlowState::IntentDetected
    }

    async fn confidence(&self, turns: &[Turn]) -> f64 {
        let Some(user_turn) = latest_user_turn(turns) else {
            return 0.0;
        };
        let content = user_turn.content.to_lowercase();

        if content.contains("task") || content.contains("remind me") {
            return 0.9;
        }
        if Self::derive_state(turns) != TaskFlowState::IntentDetected {
            return 0.85;
        }
        if TASK_KEYWORDS.iter().any(|k| content.contains(k)) {
            return 0.7;
        }
        0.1
    }

    async fn handle(&self, ctx: &TurnContext) -> Result<SpecialistReply, EngineError> {
        let state = Self::derive_state(&ctx.turns);
        let state_name = match &state {
            TaskFlowState::IntentDetected => "intent_detected",
            TaskFlowState::DetailsCollected(_) => "details_collected",
            TaskFlowState::AwaitingConfirmation(_) => "awaiting_confirmation",
        };
        debug!(state = state_name, "task flow state derived");

        match state {
            TaskFlowState::IntentDetected => self.collect(ctx, TaskDraft::default()).await,
            TaskFlowState::DetailsCollected(draft) => self.collect(ctx, draft).await,
            TaskFlowState::AwaitingConfirmation(draft) => {
                match detect_confirmation(&ctx.turns, "task", draft.title.as_deref()) {
                    ConfirmationSignal::Confirmed => Ok(self.persist(draft, ctx).await),
                    ConfirmationSignal::Denied => Ok(SpecialistReply::text(
                        "No problem. What should I change - the task itself or the due date?",
                    )),
                    ConfirmationSignal::Ambiguous => {
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
                            self.collect(ctx, draft).await
                        }
                    }
                }
            }
        }
    }
}

fn summary_block(draft: &TaskDraft) -> String {
    let mut lines = Vec::new();
    if let Some(title) = draft.title.as_deref() {
        lines.push(format!("{SUMMARY_TITLE}{title}"));
    }
    if let Some(due) = draft.due_date.as_deref() {
        lines.push(format!("{SUMMARY_DUE}{due}"));
    }
    if let Some(goal) = draft.goal_title.as_deref() {
        lines.push(format!("{SUMMARY_GOAL}{goal}"));
    }
    lines.join("\n")
}

fn parse_summary(content: &str) -> Option<TaskDraft> {
    let mut draft = TaskDraft::default();
    for line in content.lines() {
        let line = line.trim();
        if let Some(title) = line.strip_prefix(SUMMARY_TITLE) {
            draft.title = Some(title.to_string());
        } else if let Some(due) = line.strip_prefix(SUMMARY_DUE) {
            draft.due_date = Some(due.to_string());
        } else if let Some(goal) = line.strip_prefix(SUMMARY_GOAL) {
            draft.goal_title = Some(goal.to_string());
        }
    }
    draft.title.is_some().then_some(draft)
}

fn asks_task_slot(content: &str) -> bool {
    [TaskField::Title, TaskField::DueDate]
        .iter()
        .any(|f| content.contains(f.prompt()))
}
