//! Persistence gateway port - goals, tasks, owner resolution, activity logs.
//!
//! The engine persists entities through this single boundary. Implementations
//! may be an application database or an in-memory store for tests; the engine
//! never sees the difference.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{GoalId, Priority, TaskId, UserId};
use crate::domain::goal::{Goal, GoalCategory, GoalStatus};
use crate::domain::task::Task;

/// Port for entity persistence.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Resolves the shared guest owner, creating it on first use.
    ///
    /// Idempotent: repeated calls return the same owner.
    async fn resolve_guest_owner(&self) -> Result<UserId, PersistenceError>;

    /// Persists a new goal.
    async fn create_goal(&self, goal: NewGoal) -> Result<Goal, PersistenceError>;

    /// Applies a partial update to an existing goal.
    async fn update_goal(
        &self,
        owner: &UserId,
        id: GoalId,
        update: GoalUpdate,
    ) -> Result<Goal, PersistenceError>;

    /// Persists a new task; when linked to a goal, the parent goal's
    /// progress is recomputed.
    async fn create_task(&self, task: NewTask) -> Result<Task, PersistenceError>;

    /// Applies a partial update to an existing task; parent-goal progress is
    /// recomputed when completion changes.
    async fn update_task(
        &self,
        owner: &UserId,
        id: TaskId,
        update: TaskUpdate,
    ) -> Result<Task, PersistenceError>;

    /// All goals for an owner, newest first.
    async fn find_goals_by_owner(&self, owner: &UserId) -> Result<Vec<Goal>, PersistenceError>;

    /// All tasks for an owner, soonest due first.
    async fn find_tasks_by_owner(&self, owner: &UserId) -> Result<Vec<Task>, PersistenceError>;

    /// Recent activity log lines for an owner, newest first.
    async fn recent_logs(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<String>, PersistenceError>;

    /// Display name for an owner, if one is known.
    async fn display_name(&self, owner: &UserId) -> Result<Option<String>, PersistenceError>;
}

/// Fields for creating a goal. Values are already normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub priority: Priority,
    pub deadline: NaiveDate,
}

/// Partial goal update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<GoalCategory>,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub status: Option<GoalStatus>,
}

/// Fields for creating a task. Values are already normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub goal_id: Option<GoalId>,
    pub tags: Vec<String>,
    pub ai_suggested: bool,
}

/// Partial task update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub completed: Option<bool>,
}

/// Errors from the persistence gateway.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}
