//! Ports: trait boundaries between the domain and the outside world.

pub mod ai_provider;
pub mod memory_store;
pub mod persistence;

pub use ai_provider::{
    AiError, AiProvider, ChatMessage, ChatRequest, ChatResponse, ProviderInfo, TokenUsage,
};
pub use memory_store::{MemoryRecord, MemoryStore, MemoryStoreError};
pub use persistence::{
    GoalUpdate, NewGoal, NewTask, PersistenceError, PersistenceGateway, TaskUpdate,
};
