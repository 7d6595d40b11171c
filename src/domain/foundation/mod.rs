//! Shared domain primitives (identifiers, timestamps, priorities).

mod ids;
mod priority;
mod timestamp;

pub use ids::{ConversationId, GoalId, TaskId, UserId};
pub use priority::Priority;
pub use timestamp::Timestamp;
