//! Task domain: entity, due-date normalization, slot-filling draft.

mod draft;
mod entity;

pub use draft::{TaskDraft, TaskField};
pub use entity::{normalize_due_date, Task};
