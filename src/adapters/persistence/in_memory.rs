//! In-memory persistence gateway.
//!
//! Backs the engine with `RwLock`-guarded maps. Used directly in tests and as
//! the default store when no database is wired in.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::foundation::{GoalId, TaskId, Timestamp, UserId};
use crate::domain::goal::{Goal, GoalStatus};
use crate::domain::task::Task;
use crate::ports::{
    GoalUpdate, NewGoal, NewTask, PersistenceError, PersistenceGateway, TaskUpdate,
};

/// In-memory entity store keyed by owner.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    goals: Arc<RwLock<HashMap<GoalId, Goal>>>,
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
    display_names: Arc<RwLock<HashMap<UserId, String>>>,
    activity: Arc<RwLock<HashMap<UserId, Vec<String>>>>,
}

impl InMemoryGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a display name for an owner.
    pub async fn set_display_name(&self, owner: UserId, name: impl Into<String>) {
        self.display_names.write().await.insert(owner, name.into());
    }

    /// Appends an activity log line for an owner.
    pub async fn log_activity(&self, owner: &UserId, line: impl Into<String>) {
        self.activity
            .write()
            .await
            .entry(owner.clone())
            .or_default()
            .push(line.into());
    }

    /// Recomputes a goal's progress from its linked tasks. Caller holds the
    /// goal write lock.
    async fn refresh_goal_progress(&self, goals: &mut HashMap<GoalId, Goal>, goal_id: GoalId) {
        let tasks = self.tasks.read().await;
        let linked: Vec<&Task> = tasks.values().filter(|t| t.goal_id == Some(goal_id)).collect();
        let completed = linked.iter().filter(|t| t.completed).count();

        if let Some(goal) = goals.get_mut(&goal_id) {
            goal.task_ids = linked.iter().map(|t| t.id).collect();
            goal.recompute_progress(completed, linked.len());
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn resolve_guest_owner(&self) -> Result<UserId, PersistenceError> {
        let guest = UserId::guest();
        let mut names = self.display_names.write().await;
        names.entry(guest.clone()).or_insert_with(|| "Guest".to_string());
        Ok(guest)
    }

    async fn create_goal(&self, new: NewGoal) -> Result<Goal, PersistenceError> {
        if new.title.trim().is_empty() {
            return Err(PersistenceError::Validation("goal title is empty".to_string()));
        }

        let goal = Goal {
            id: GoalId::new(),
            owner: new.owner,
            title: new.title,
            description: new.description,
            category: new.category,
            priority: new.priority,
            deadline: new.deadline,
            progress: 0,
            status: GoalStatus::NotStarted,
            task_ids: Vec::new(),
            created_at: Timestamp::now(),
        };
        debug!(goal_id = %goal.id, title = %goal.title, "goal created");

        self.log_activity(&goal.owner, format!("Created goal \"{}\"", goal.title))
            .await;
        self.goals.write().await.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn update_goal(
        &self,
        owner: &UserId,
        id: GoalId,
        update: GoalUpdate,
    ) -> Result<Goal, PersistenceError> {
        let mut goals = self.goals.write().await;
        let goal = goals
            .get_mut(&id)
            .filter(|g| &g.owner == owner)
            .ok_or_else(|| PersistenceError::NotFound {
                entity: "goal",
                id: id.to_string(),
            })?;

        if let Some(title) = update.title {
            goal.title = title;
        }
        if let Some(description) = update.description {
            goal.description = description;
        }
        if let Some(category) = update.category {
            goal.category = category;
        }
        if let Some(priority) = update.priority {
            goal.priority = priority;
        }
        if let Some(deadline) = update.deadline {
            goal.deadline = deadline;
        }
        if let Some(status) = update.status {
            goal.status = status;
        }
        Ok(goal.clone())
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, PersistenceError> {
        if new.title.trim().is_empty() {
            return Err(PersistenceError::Validation("task title is empty".to_string()));
        }

        if let Some(goal_id) = new.goal_id {
            let goals = self.goals.read().await;
            if !goals.contains_key(&goal_id) {
                return Err(PersistenceError::NotFound {
                    entity: "goal",
                    id: goal_id.to_string(),
                });
            }
        }

        let task = Task {
            id: TaskId::new(),
            owner: new.owner,
            title: new.title,
            description: new.description,
            priority: new.priority,
            due_date: new.due_date,
            goal_id: new.goal_id,
            tags: new.tags,
            ai_suggested: new.ai_suggested,
            completed: false,
            completed_at: None,
            created_at: Timestamp::now(),
        };
        debug!(task_id = %task.id, title = %task.title, "task created");

        self.log_activity(&task.owner, format!("Created task \"{}\"", task.title))
            .await;
        self.tasks.write().await.insert(task.id, task.clone());

        if let Some(goal_id) = task.goal_id {
            let mut goals = self.goals.write().await;
            self.refresh_goal_progress(&mut goals, goal_id).await;
        }
        Ok(task)
    }

    async fn update_task(
        &self,
        owner: &UserId,
        id: TaskId,
        update: TaskUpdate,
    ) -> Result<Task, PersistenceError> {
        let updated = {
            let mut tasks = self.tasks.write().await;
            let task = tasks
                .get_mut(&id)
                .filter(|t| &t.owner == owner)
                .ok_or_else(|| PersistenceError::NotFound {
                    entity: "task",
                    id: id.to_string(),
                })?;

            if let Some(title) = update.title {
                task.title = title;
            }
            if let Some(description) = update.description {
                task.description = description;
            }
            if let Some(priority) = update.priority {
                task.priority = priority;
            }
            if let Some(due_date) = update.due_date {
                task.due_date = due_date;
            }
            match update.completed {
                Some(true) => task.complete(),
                Some(false) => {
                    task.completed = false;
                    task.completed_at = None;
                }
                None => {}
            }
            task.clone()
        };

        if let Some(goal_id) = updated.goal_id {
            let mut goals = self.goals.write().await;
            self.refresh_goal_progress(&mut goals, goal_id).await;
        }
        Ok(updated)
    }

    async fn find_goals_by_owner(&self, owner: &UserId) -> Result<Vec<Goal>, PersistenceError> {
        let goals = self.goals.read().await;
        let mut owned: Vec<Goal> = goals.values().filter(|g| &g.owner == owner).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_tasks_by_owner(&self, owner: &UserId) -> Result<Vec<Task>, PersistenceError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<Task> = tasks.values().filter(|t| &t.owner == owner).cloned().collect();
        owned.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(owned)
    }

    async fn recent_logs(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<String>, PersistenceError> {
        let activity = self.activity.read().await;
        let lines = activity.get(owner).cloned().unwrap_or_default();
        Ok(lines.into_iter().rev().take(limit).collect())
    }

    async fn display_name(&self, owner: &UserId) -> Result<Option<String>, PersistenceError> {
        Ok(self.display_names.read().await.get(owner).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::foundation::Priority;
    use crate::domain::goal::GoalCategory;

    fn owner() -> UserId {
        UserId::new("owner-1").unwrap()
    }

    fn new_goal(title: &str) -> NewGoal {
        NewGoal {
            owner: owner(),
            title: title.to_string(),
            description: String::new(),
            category: GoalCategory::Health,
            priority: Priority::Medium,
            deadline: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        }
    }

    fn new_task(title: &str, goal_id: Option<GoalId>) -> NewTask {
        NewTask {
            owner: owner(),
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            goal_id,
            tags: Vec::new(),
            ai_suggested: false,
        }
    }

    #[tokio::test]
    async fn guest_owner_resolution_is_idempotent() {
        let gateway = InMemoryGateway::new();
        let first = gateway.resolve_guest_owner().await.unwrap();
        let second = gateway.resolve_guest_owner().await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_guest());
    }

    #[tokio::test]
    async fn empty_goal_title_is_rejected() {
        let gateway = InMemoryGateway::new();
        let err = gateway.create_goal(new_goal("   ")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));
    }

    #[tokio::test]
    async fn completing_linked_tasks_updates_goal_progress() {
        let gateway = InMemoryGateway::new();
        let goal = gateway.create_goal(new_goal("Run a marathon")).await.unwrap();

        let t1 = gateway.create_task(new_task("Buy shoes", Some(goal.id))).await.unwrap();
        let _t2 = gateway.create_task(new_task("Plan route", Some(goal.id))).await.unwrap();

        gateway
            .update_task(
                &owner(),
                t1.id,
                TaskUpdate {
                    completed: Some(true),
                    ..TaskUpdate::default()
                },
            )
            .await
            .unwrap();

        let goals = gateway.find_goals_by_owner(&owner()).await.unwrap();
        assert_eq!(goals[0].progress, 50);
        assert_eq!(goals[0].status, GoalStatus::InProgress);
        assert_eq!(goals[0].task_ids.len(), 2);
    }

    #[tokio::test]
    async fn task_with_unknown_goal_is_rejected() {
        let gateway = InMemoryGateway::new();
        let err = gateway
            .create_task(new_task("orphan", Some(GoalId::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { entity: "goal", .. }));
    }

    #[tokio::test]
    async fn goals_owned_by_others_are_invisible() {
        let gateway = InMemoryGateway::new();
        let goal = gateway.create_goal(new_goal("Private goal")).await.unwrap();

        let stranger = UserId::new("stranger").unwrap();
        let err = gateway
            .update_goal(&stranger, goal.id, GoalUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { .. }));
        assert!(gateway.find_goals_by_owner(&stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_logs_are_newest_first_and_limited() {
        let gateway = InMemoryGateway::new();
        gateway.create_goal(new_goal("Goal A")).await.unwrap();
        gateway.create_goal(new_goal("Goal B")).await.unwrap();
        gateway.create_goal(new_goal("Goal C")).await.unwrap();

        let logs = gateway.recent_logs(&owner(), 2).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs[0].contains("Goal C"));
        assert!(logs[1].contains("Goal B"));
    }
}
