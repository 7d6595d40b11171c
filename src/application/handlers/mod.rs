//! Command handlers.

mod process_turn;

pub use process_turn::{ProcessTurnCommand, ProcessTurnHandler, ProcessTurnResult};
