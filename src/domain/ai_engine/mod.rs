//! Conversation orchestration engine.
//!
//! Turns unstructured multi-turn chat into structured side effects:
//! classification, confidence-based specialist routing, slot-filling state
//! machines, two-tier action execution, and a general-conversation fallback.

mod classifier;
mod errors;
mod executor;
mod extraction;
mod general;
mod json;
mod orchestrator;
mod registry;
mod specialist;
pub mod specialists;
mod values;

pub use classifier::IntentClassifier;
pub use errors::EngineError;
pub use executor::{Action, ActionExecutor, ActionResult};
pub use extraction::EntityExtractor;
pub use general::{GeneralHandler, GENERAL_HANDLER_NAME};
pub use orchestrator::{ConversationEngine, EngineBuilder};
pub use registry::SpecialistRouter;
pub use specialist::{Specialist, SpecialistReply, TurnContext};
pub use values::{CreatedEntity, Domain, IntentAnalysis, Sentiment, TurnOutcome};
