//! Application layer: command handlers over the domain engine.

pub mod handlers;
