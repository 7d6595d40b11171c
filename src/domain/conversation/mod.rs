//! Conversation primitives: turns, bounded memory, confirmation detection.

pub mod confirmation;
mod memory;
mod turn;

pub use confirmation::{detect_confirmation, ConfirmationSignal};
pub use memory::{ConversationMemory, MemoryRegistry, DEFAULT_MEMORY_CAPACITY};
pub use turn::{assistant_turn_before_last_user, latest_user_turn, Turn, TurnRole};
