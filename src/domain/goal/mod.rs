//! Goal domain: entity, category/deadline normalization, slot-filling draft.

mod draft;
mod entity;

pub use draft::{GoalDraft, GoalField};
pub use entity::{normalize_deadline, Goal, GoalCategory, GoalStatus};
