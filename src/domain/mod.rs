//! Domain layer: pure business logic with no I/O.

pub mod ai_engine;
pub mod conversation;
pub mod foundation;
pub mod goal;
pub mod task;
