//! Aurelius - Conversation orchestration core for a goal-coaching assistant.
//!
//! Turns unstructured multi-turn chat into structured side effects (goals,
//! tasks) while carrying on open-ended coaching dialogue. The pipeline for
//! each inbound turn is: conversation memory update, intent classification,
//! confidence-scored specialist routing, slot-filling state machines, and a
//! two-tier action executor with deterministic fallback.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
