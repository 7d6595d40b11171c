//! Engine value objects: intent analysis, routing domains, turn outcomes.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::Turn;
use crate::domain::foundation::{GoalId, TaskId};

/// Coarse conversation domain produced by the intent classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    GoalSetting,
    TaskManagement,
    FitnessHealth,
    ProgrammingTechnical,
    #[default]
    GeneralChat,
}

impl Domain {
    /// Parses a classifier label; unknown labels fall back to general chat.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "goal_setting" => Self::GoalSetting,
            "task_management" => Self::TaskManagement,
            "fitness_health" => Self::FitnessHealth,
            "programming_technical" => Self::ProgrammingTechnical,
            _ => Self::GeneralChat,
        }
    }

    /// Returns the classifier label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoalSetting => "goal_setting",
            Self::TaskManagement => "task_management",
            Self::FitnessHealth => "fitness_health",
            Self::ProgrammingTechnical => "programming_technical",
            Self::GeneralChat => "general_chat",
        }
    }
}

/// Sentiment of the latest user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
    Confused,
}

impl Sentiment {
    /// Parses a classifier label; unknown labels fall back to neutral.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "confused" => Self::Confused,
            _ => Self::Neutral,
        }
    }
}

/// Per-turn classification result. Recomputed every turn, never persisted
/// beyond the routing decision it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub primary_intent: String,
    pub domain: Domain,
    pub sentiment: Sentiment,
    pub confidence: f64,
}

impl IntentAnalysis {
    /// Degraded analysis used whenever classification fails. Routing
    /// confidence collapses to zero so the turn lands in general chat.
    pub fn fallback() -> Self {
        Self {
            primary_intent: "unknown".to_string(),
            domain: Domain::GeneralChat,
            sentiment: Sentiment::Neutral,
            confidence: 0.0,
        }
    }
}

/// Entity persisted while handling a turn, surfaced for client UI hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreatedEntity {
    Goal { id: GoalId, title: String },
    Task { id: TaskId, title: String },
}

impl CreatedEntity {
    /// Title of the created entity.
    pub fn title(&self) -> &str {
        match self {
            Self::Goal { title, .. } | Self::Task { title, .. } => title,
        }
    }
}

/// Result of processing one inbound turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's reply.
    pub assistant_turn: Turn,
    /// Name of the handler that produced the reply ("goal_specialist",
    /// "general_conversation", ...).
    pub handler: String,
    /// Entity persisted during this turn, if any.
    pub entity: Option<CreatedEntity>,
}
