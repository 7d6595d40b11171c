//! Incremental task draft assembled across slot-filling turns.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Priority;

/// Required task fields, in ask order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    DueDate,
}

impl TaskField {
    /// The follow-up question asked when this field is missing.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Title => "What task would you like to add?",
            Self::DueDate => "When does this need to be done by?",
        }
    }
}

/// Partially extracted task, merged monotonically turn over turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Title of the goal the user wants this task attached to, if mentioned.
    #[serde(default)]
    pub goal_title: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl TaskDraft {
    /// Merges newly extracted fields; filled fields are never cleared and
    /// the latest non-empty value wins.
    pub fn merge(&mut self, newer: TaskDraft) {
        merge_field(&mut self.title, newer.title);
        merge_field(&mut self.due_date, newer.due_date);
        merge_field(&mut self.description, newer.description);
        merge_field(&mut self.priority, newer.priority);
        merge_field(&mut self.goal_title, newer.goal_title);
        if newer.confidence.is_some() {
            self.confidence = newer.confidence;
        }
    }

    /// Required fields still missing, in ask order.
    pub fn missing_fields(&self) -> Vec<TaskField> {
        let mut missing = Vec::new();
        if is_blank(&self.title) {
            missing.push(TaskField::Title);
        }
        if is_blank(&self.due_date) {
            missing.push(TaskField::DueDate);
        }
        missing
    }

    /// True once every required field is filled.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
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
