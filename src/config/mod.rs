//! Application configuration
//!
//! Loaded from environment variables with the `AURELIUS_` prefix and `__`
//! section separator (e.g. `AURELIUS_AI__CHAT_MODEL`, `AURELIUS_ENGINE__
//! ROUTING_THRESHOLD`). A `.env` file is honored in development.

mod ai;
mod engine;
mod error;

pub use ai::AiConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};

use serde::Deserialize;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Orchestration engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Loads configuration from the environment, validating all sections.
    pub fn load() -> Result<Self, ConfigError> {
        // Best-effort .env loading; absence is not an error
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("AURELIUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the full configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}
