//! Task entity and due-date normalization.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GoalId, Priority, TaskId, Timestamp, UserId};

/// Days ahead a task lands when the user gives no usable due date.
const DEFAULT_DUE_DAYS: i64 = 7;

/// A persisted task, optionally linked to a parent goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
    /// Parent goal whose progress this task feeds, if any.
    pub goal_id: Option<GoalId>,
    pub tags: Vec<String>,
    /// True when the assistant proposed this task rather than the user.
    pub ai_suggested: bool,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Task {
    /// Marks the task done, stamping the completion time once.
    pub fn complete(&mut self) {
        if !self.completed {
            self.completed = true;
            self.completed_at = Some(Timestamp::now());
        }
    }
}

/// Normalizes a raw due-date string to a calendar date.
///
/// Accepts ISO dates; anything unparsable or absent falls back to one week
/// from today. Idempotent for already-normalized dates.
pub fn normalize_due_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    let fallback = || today + Duration::days(DEFAULT_DUE_DAYS);

    let Some(raw) = raw else {
        return fallback();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback();
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").unwrap_or_else(|_| fallback())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn missing_due_date_defaults_to_one_week_out() {
        assert_eq!(
            normalize_due_date(None, today()),
            NaiveDate::from_ymd_opt(2025, 6, 22).unwrap()
        );
    }

    #[test]
    fn unparsable_due_date_defaults_to_one_week_out() {
        assert_eq!(
            normalize_due_date(Some("sometime soon"), today()),
            NaiveDate::from_ymd_opt(2025, 6, 22).unwrap()
        );
    }

    #[test]
    fn iso_due_date_is_kept() {
        assert_eq!(
            normalize_due_date(Some("2025-07-04"), today()),
            NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = normalize_due_date(Some("tomorrow-ish"), today());
        let second = normalize_due_date(Some(&first.to_string()), today());
        assert_eq!(first, second);
    }

    #[test]
    fn complete_stamps_completion_once() {
        let mut task = Task {
            id: TaskId::new(),
            owner: UserId::guest(),
            title: "Buy running shoes".to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: today(),
            goal_id: None,
            tags: Vec::new(),
            ai_suggested: false,
            completed: false,
            completed_at: None,
            created_at: Timestamp::now(),
        };
        task.complete();
        assert!(task.completed);
        let first_stamp = task.completed_at.clone();
        assert!(first_stamp.is_some());

        task.complete();
        assert_eq!(task.completed_at, first_stamp);
    }
}
