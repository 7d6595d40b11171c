//! Incremental goal draft assembled across slot-filling turns.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Priority;

use super::entity::GoalCategory;

/// Required draft fields, in the order they are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Title,
    Category,
    Deadline,
}

impl GoalField {
    /// The follow-up question asked when this field is missing.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Title => "What goal would you like to set for yourself?",
            Self::Category => {
                "What area of your life is this goal for - career, health, personal, financial, or learning?"
            }
            Self::Deadline => "When would you like to achieve this by?",
        }
    }
}

/// Partially extracted goal, merged monotonically turn over turn.
///
/// The deadline stays raw text until persist time; normalization happens
/// once, in the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl GoalDraft {
    /// Merges newly extracted fields into this draft.
    ///
    /// Merging is monotonic: a field already filled is never cleared by a
    /// later turn that omits it, but a later non-empty value replaces the
    /// earlier one (the user's most recent statement wins).
    pub fn merge(&mut self, newer: GoalDraft) {
        merge_field(&mut self.title, newer.title);
        merge_field(&mut self.category, newer.category);
        merge_field(&mut self.deadline, newer.deadline);
        merge_field(&mut self.description, newer.description);
        merge_field(&mut self.priority, newer.priority);
        if newer.confidence.is_some() {
            self.confidence = newer.confidence;
        }
    }

    /// Required fields still missing, in ask order.
    pub fn missing_fields(&self) -> Vec<GoalField> {
        let mut missing = Vec::new();
        if is_blank(&self.title) {
            missing.push(GoalField::Title);
        }
        if is_blank(&self.category) {
            missing.push(GoalField::Category);
        }
        if is_blank(&self.deadline) {
            missing.push(GoalField::Deadline);
        }
        missing
    }

    /// True once every required field is filled.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Parsed category, honoring the alias normalization.
    pub fn parsed_category(&self) -> GoalCategory {
        self.category
            .as_deref()
            .map(GoalCategory::parse)
            .unwrap_or_default()
    }

    /// Parsed priority, defaulting to medium.
    pub fn parsed_priority(&self) -> Priority {
        self.priority
            .as_deref()
            .map(Priority::parse)
            .unwrap_or_default()
    }
}

fn merge_field(current: &mut Option<String>, newer: Option<String>) {
    if let Some(value) = newer {
        if !value.trim().is_empty() {
            *current = Some(value);
        }
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map(str::trim).unwrap_or("").is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_is_missing_everything() {
        let draft = GoalDraft::default();
        assert_eq!(
            draft.missing_fields(),
            vec![GoalField::Title, GoalField::Category, GoalField::Deadline]
        );
        assert!(!draft.is_complete());
    }

    #[test]
    fn merge_fills_without_clearing() {
        let mut draft = GoalDraft {
            title: Some("Bench press 225 lbs".to_string()),
            ..GoalDraft::default()
        };
        draft.merge(GoalDraft {
            category: Some("fitness".to_string()),
            ..GoalDraft::default()
        });
        assert_eq!(draft.title.as_deref(), Some("Bench press 225 lbs"));
        assert_eq!(draft.category.as_deref(), Some("fitness"));
    }

    #[test]
    fn merge_prefers_latest_non_empty_value() {
        let mut draft = GoalDraft {
            deadline: Some("next month".to_string()),
            ..GoalDraft::default()
        };
        draft.merge(GoalDraft {
            deadline: Some("2025-12-31".to_string()),
            ..GoalDraft::default()
        });
        assert_eq!(draft.deadline.as_deref(), Some("2025-12-31"));

        draft.merge(GoalDraft {
            deadline: Some("   ".to_string()),
            ..GoalDraft::default()
        });
        assert_eq!(draft.deadline.as_deref(), Some("2025-12-31"));
    }

    #[test]
    fn complete_once_required_fields_fill() {
        let draft = GoalDraft {
            title: Some("Run a marathon".to_string()),
            category: Some("health".to_string()),
            deadline: Some("2026-04-01".to_string()),
            ..GoalDraft::default()
        };
        assert!(draft.is_complete());
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let draft = GoalDraft {
            title: Some("  ".to_string()),
            ..GoalDraft::default()
        };
        assert_eq!(draft.missing_fields()[0], GoalField::Title);
    }

    #[test]
    fn parsed_category_honors_alias_normalization() {
        let draft = GoalDraft {
            category: Some("fitness".to_string()),
            ..GoalDraft::default()
        };
        assert_eq!(draft.parsed_category(), GoalCategory::Health);
    }
}
