//! Action executor.
//!
//! Turns a confirmed draft into a persisted entity through two tiers. The
//! model-assisted tier asks the gateway to fill a declarative action schema
//! (it never produces code to run); the deterministic tier builds the entity
//! directly from the draft. Both tiers converge on the same fixed persist
//! path and the same normalization rules, so callers cannot tell which ran.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::foundation::UserId;
use crate::domain::goal::{normalize_deadline, GoalDraft};
use crate::domain::task::{normalize_due_date, TaskDraft};
use crate::ports::{AiProvider, ChatRequest, NewGoal, NewTask, PersistenceGateway};

use super::json::extract_json_object;
use super::values::CreatedEntity;

const ACTION_PROMPT: &str = "You fill a declarative action schema for a goal-coaching assistant.\n\
Given a draft, respond with a JSON object only:\n\
{\"action\": \"<the action name you were given>\", \"params\": {<the draft fields, cleaned up: \
title as a short imperative phrase, dates as ISO YYYY-MM-DD>}}\n\
If you cannot improve on the draft, respond with {\"action\": \"delegate\"}. No prose, no code.";

/// A confirmed, executable action. The closed set here is the whole
/// model-reachable surface: execution is always performed by fixed code.
#[derive(Debug, Clone)]
pub enum Action {
    CreateGoal(GoalDraft),
    CreateTask(TaskDraft),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::CreateGoal(_) => "create_goal",
            Self::CreateTask(_) => "create_task",
        }
    }
}

/// Terminal result of executing an action. Never partially applied: either
/// `entity` is persisted or nothing is.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub success: bool,
    pub entity: Option<CreatedEntity>,
    pub error: Option<String>,
}

impl ActionResult {
    fn created(entity: CreatedEntity) -> Self {
        Self {
            success: true,
            entity: Some(entity),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            entity: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAction {
    #[serde(default)]
    action: String,
    #[serde(default)]
    params: serde_json::Value,
}

/// Two-tier executor over the persistence gateway.
pub struct ActionExecutor {
    persistence: Arc<dyn PersistenceGateway>,
    model: Option<Arc<dyn AiProvider>>,
    model_actions_enabled: bool,
    timeout: Duration,
}

impl ActionExecutor {
    /// Creates an executor. The model tier runs only when both a provider is
    /// present and model actions are enabled; the deterministic tier is
    /// always available.
    pub fn new(
        persistence: Arc<dyn PersistenceGateway>,
        model: Option<Arc<dyn AiProvider>>,
        model_actions_enabled: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            persistence,
            model,
            model_actions_enabled,
            timeout,
        }
    }

    /// Executes a confirmed action for an owner. Guest callers are resolved
    /// to the canonical guest owner before persisting.
    pub async fn execute(&self, action: Action, owner: &UserId) -> ActionResult {
        let owner = if owner.is_guest() {
            match self.persistence.resolve_guest_owner().await {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!(error = %err, "guest owner resolution failed");
                    return ActionResult::failed(err.to_string());
                }
            }
        } else {
            owner.clone()
        };

        let action = self.refine_via_model(action).await;

        match action {
            Action::CreateGoal(draft) => self.persist_goal(draft, &owner).await,
            Action::CreateTask(draft) => self.persist_task(draft, &owner).await,
        }
    }

    /// Model-assisted tier: ask the gateway to fill the action schema.
    /// Any failure - disabled, delegate marker, wrong action name, bad JSON,
    /// timeout - returns the original action for the deterministic tier.
    async fn refine_via_model(&self, action: Action) -> Action {
        if !self.model_actions_enabled {
            return action;
        }
        let Some(model) = &self.model else {
            return action;
        };

        let draft_json = match &action {
            Action::CreateGoal(draft) => serde_json::to_string(draft),
            Action::CreateTask(draft) => serde_json::to_string(draft),
        };
        let Ok(draft_json) = draft_json else {
            return action;
        };

        let request = ChatRequest::new()
            .with_system_prompt(ACTION_PROMPT)
            .with_json_mode()
            .with_temperature(0.0)
            .with_max_tokens(300)
            .with_message(
                crate::domain::conversation::TurnRole::User,
                format!("action: {}\ndraft: {draft_json}", action.name()),
            );

        let content = match tokio::time::timeout(self.timeout, model.complete(request)).await {
            Ok(Ok(response)) => response.content,
            Ok(Err(err)) => {
                warn!(error = %err, "model action tier failed, delegating to deterministic tier");
                return action;
            }
            Err(_) => {
                warn!("model action tier timed out, delegating to deterministic tier");
                return action;
            }
        };

        let Some(json) = extract_json_object(&content) else {
            return action;
        };
        let Ok(wire) = serde_json::from_str::<WireAction>(&json) else {
            return action;
        };
        if wire.action != action.name() {
            debug!(returned = %wire.action, "model delegated or named an unknown action");
            return action;
        }

        match &action {
            Action::CreateGoal(original) => {
                match serde_json::from_value::<GoalDraft>(wire.params) {
                    Ok(refined) => {
                        // The model refines, it never erases.
                        let mut merged = original.clone();
                        merged.merge(refined);
                        Action::CreateGoal(merged)
                    }
                    Err(_) => action,
                }
            }
            Action::CreateTask(original) => {
                match serde_json::from_value::<TaskDraft>(wire.params) {
                    Ok(refined) => {
                        let mut merged = original.clone();
                        merged.merge(refined);
                        Action::CreateTask(merged)
                    }
                    Err(_) => action,
                }
            }
        }
    }

    /// Deterministic tier for goals: normalize and persist.
    async fn persist_goal(&self, draft: GoalDraft, owner: &UserId) -> ActionResult {
        let Some(title) = draft.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return ActionResult::failed("goal draft has no title");
        };

        let today = Utc::now().date_naive();
        let new_goal = NewGoal {
            owner: owner.clone(),
            title: title.to_string(),
            description: draft.description.clone().unwrap_or_default(),
            category: draft.parsed_category(),
            priority: draft.parsed_priority(),
            deadline: normalize_deadline(draft.deadline.as_deref(), today),
        };

        match self.persistence.create_goal(new_goal).await {
            Ok(goal) => {
                info!(goal_id = %goal.id, "goal persisted");
                ActionResult::created(CreatedEntity::Goal {
                    id: goal.id,
                    title: goal.title,
                })
            }
            Err(err) => {
                warn!(error = %err, "deterministic goal persist failed");
                ActionResult::failed(err.to_string())
            }
        }
    }

    /// Deterministic tier for tasks: normalize, link to a parent goal by
    /// title when one was mentioned, persist.
    async fn persist_task(&self, draft: TaskDraft, owner: &UserId) -> ActionResult {
        let Some(title) = draft.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return ActionResult::failed("task draft has no title");
        };

        let goal_id = match draft.goal_title.as_deref() {
            Some(goal_title) => match self.persistence.find_goals_by_owner(owner).await {
                Ok(goals) => {
                    let wanted = goal_title.to_lowercase();
                    goals
                        .iter()
                        .find(|g| g.title.to_lowercase().contains(&wanted))
                        .map(|g| g.id)
                }
                Err(err) => {
                    warn!(error = %err, "goal lookup for task linkage failed, creating unlinked");
                    None
                }
            },
            None => None,
        };

        let today = Utc::now().date_naive();
        let new_task = NewTask {
            owner: owner.clone(),
            title: title.to_string(),
            description: draft.description.clone().unwrap_or_default(),
            priority: draft.parsed_priority(),
            due_date: normalize_due_date(draft.due_date.as_deref(), today),
            goal_id,
            tags: Vec::new(),
            ai_suggested: false,
        };

        match self.persistence.create_task(new_task).await {
            Ok(task) => {
                info!(task_id = %task.id, "task persisted");
                ActionResult::created(CreatedEntity::Task {
                    id: task.id,
                    title: task.title,
                })
            }
            Err(err) => {
                warn!(error = %err, "deterministic task persist failed");
                ActionResult::failed(err.to_string())
            }
        }
    }
}
