//! Goal entity and category/deadline normalization.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GoalId, Priority, TaskId, Timestamp, UserId};

/// Persisted goal category.
///
/// "fitness" is a user-facing alias, not a persisted category: it always
/// normalizes to `Health` at the single parse chokepoint below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Career,
    Health,
    Personal,
    Financial,
    Learning,
    #[default]
    Other,
}

impl GoalCategory {
    /// Parses a user-facing category label.
    ///
    /// Unknown labels fall back to `Other`. Normalization is idempotent:
    /// parsing a persisted label yields the same variant.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "career" | "work" => Self::Career,
            "health" | "fitness" => Self::Health,
            "personal" => Self::Personal,
            "financial" | "finance" | "money" => Self::Financial,
            "learning" | "education" => Self::Learning,
            _ => Self::Other,
        }
    }

    /// Returns the persisted label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Career => "career",
            Self::Health => "health",
            Self::Personal => "personal",
            Self::Financial => "financial",
            Self::Learning => "learning",
            Self::Other => "other",
        }
    }
}

/// Lifecycle status of a goal, derived from task progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

/// A persisted goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub priority: Priority,
    pub deadline: NaiveDate,
    /// Percentage of linked tasks completed, 0..=100.
    pub progress: u8,
    pub status: GoalStatus,
    pub task_ids: Vec<TaskId>,
    pub created_at: Timestamp,
}

impl Goal {
    /// Recomputes progress and status from linked-task completion counts.
    ///
    /// A goal with no linked tasks keeps its current progress.
    pub fn recompute_progress(&mut self, completed_tasks: usize, total_tasks: usize) {
        if total_tasks == 0 {
            return;
        }
        let ratio = completed_tasks as f64 / total_tasks as f64;
        self.progress = (ratio * 100.0).round() as u8;
        self.status = match self.progress {
            0 => GoalStatus::NotStarted,
            100 => GoalStatus::Completed,
            _ => GoalStatus::InProgress,
        };
    }
}

/// Normalizes a raw deadline string to a calendar date.
///
/// Accepts ISO dates (`2025-12-31`); anything unparsable or absent falls
/// back to Dec 31 of the current year - the default goal horizon. The
/// operation is idempotent: normalizing an already-normalized date changes
/// nothing.
pub fn normalize_deadline(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    let end_of_year = || {
        // Dec 31 exists in every year
        NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today)
    };

    let Some(raw) = raw else {
        return end_of_year();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return end_of_year();
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").unwrap_or_else(|_| end_of_year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn goal() -> Goal {
        Goal {
            id: GoalId::new(),
            owner: UserId::new("u1").unwrap(),
            title: "Bench press 225 lbs".to_string(),
            description: String::new(),
            category: GoalCategory::Health,
            priority: Priority::Medium,
            deadline: today(),
            progress: 0,
            status: GoalStatus::NotStarted,
            task_ids: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    mod category {
        use super::*;

        #[test]
        fn fitness_normalizes_to_health() {
            assert_eq!(GoalCategory::parse("fitness"), GoalCategory::Health);
            assert_eq!(GoalCategory::parse("Fitness"), GoalCategory::Health);
        }

        #[test]
        fn normalization_is_idempotent() {
            let once = GoalCategory::parse("fitness");
            let twice = GoalCategory::parse(once.as_str());
            assert_eq!(once, GoalCategory::Health);
            assert_eq!(twice, GoalCategory::Health);
        }

        #[test]
        fn unknown_labels_fall_back_to_other() {
            assert_eq!(GoalCategory::parse("astral projection"), GoalCategory::Other);
        }

        #[test]
        fn known_labels_parse() {
            assert_eq!(GoalCategory::parse("career"), GoalCategory::Career);
            assert_eq!(GoalCategory::parse("learning"), GoalCategory::Learning);
            assert_eq!(GoalCategory::parse("financial"), GoalCategory::Financial);
        }
    }

    mod deadline {
        use super::*;

        #[test]
        fn missing_deadline_defaults_to_end_of_year() {
            let normalized = normalize_deadline(None, today());
            assert_eq!(normalized, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        }

        #[test]
        fn unparsable_deadline_defaults_to_end_of_year() {
            let normalized = normalize_deadline(Some("end of year"), today());
            assert_eq!(normalized, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        }

        #[test]
        fn iso_deadline_is_kept() {
            let normalized = normalize_deadline(Some("2025-09-01"), today());
            assert_eq!(normalized, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        }

        #[test]
        fn normalization_is_idempotent() {
            let first = normalize_deadline(Some("whenever"), today());
            let second = normalize_deadline(Some(&first.to_string()), today());
            assert_eq!(first, second);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn deadline_normalization_is_idempotent(raw in ".{0,40}") {
                let first = normalize_deadline(Some(&raw), today());
                let second = normalize_deadline(Some(&first.to_string()), today());
                prop_assert_eq!(first, second);
            }

            #[test]
            fn category_normalization_is_idempotent(raw in "[a-zA-Z ]{0,20}") {
                let once = GoalCategory::parse(&raw);
                let twice = GoalCategory::parse(once.as_str());
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn progress_stays_in_percent_range(completed in 0usize..50, extra in 0usize..50) {
                let mut g = super::goal();
                g.recompute_progress(completed, completed + extra);
                prop_assert!(g.progress <= 100);
            }
        }
    }

    mod progress {
        use super::*;

        #[test]
        fn progress_rounds_to_percentage() {
            let mut g = goal();
            g.recompute_progress(1, 3);
            assert_eq!(g.progress, 33);
            assert_eq!(g.status, GoalStatus::InProgress);
        }

        #[test]
        fn all_tasks_done_completes_goal() {
            let mut g = goal();
            g.recompute_progress(4, 4);
            assert_eq!(g.progress, 100);
            assert_eq!(g.status, GoalStatus::Completed);
        }

        #[test]
        fn zero_tasks_leaves_progress_untouched() {
            let mut g = goal();
            g.progress = 40;
            g.status = GoalStatus::InProgress;
            g.recompute_progress(0, 0);
            assert_eq!(g.progress, 40);
            assert_eq!(g.status, GoalStatus::InProgress);
        }

        #[test]
        fn no_completed_tasks_means_not_started() {
            let mut g = goal();
            g.recompute_progress(0, 5);
            assert_eq!(g.progress, 0);
            assert_eq!(g.status, GoalStatus::NotStarted);
        }
    }
}
