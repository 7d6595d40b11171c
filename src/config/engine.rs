//! Orchestration engine configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Tunables for routing, confirmation, and conversation memory.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Minimum specialist confidence to route away from general chat.
    /// The boundary is inclusive on the specialist side.
    #[serde(default = "default_routing_threshold")]
    pub routing_threshold: f32,

    /// Minimum confidence for semantic confirmation detection.
    #[serde(default = "default_confirmation_threshold")]
    pub confirmation_threshold: f32,

    /// Number of turns kept in the per-conversation memory window.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

impl EngineConfig {
    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.routing_threshold) {
            return Err(ValidationError::InvalidRoutingThreshold);
        }
        if !(0.0..=1.0).contains(&self.confirmation_threshold) {
            return Err(ValidationError::InvalidConfirmationThreshold);
        }
        if !(1..=64).contains(&self.memory_capacity) {
            return Err(ValidationError::InvalidMemoryCapacity);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            routing_threshold: default_routing_threshold(),
            confirmation_threshold: default_confirmation_threshold(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

fn default_routing_threshold() -> f32 {
    0.6
}

fn default_confirmation_threshold() -> f32 {
    0.6
}

fn default_memory_capacity() -> usize {
    10
}
