//! Technical specialist: programming questions answered with the extraction
//! (code-oriented) model rather than the chat model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::conversation::{latest_user_turn, Turn};
use crate::ports::{AiProvider, ChatRequest};

use super::super::errors::EngineError;
use super::super::specialist::{Specialist, SpecialistReply, TurnContext};
use super::super::values::Domain;

const PERSONA_PROMPT: &str = "You are a pragmatic senior engineer inside a goal-coaching assistant. \
Answer programming and technology questions precisely, with short code examples when useful. \
If the user is trying to learn a technology, suggest turning it into a learning goal.";

const APOLOGY: &str =
    "I'm sorry, I'm having trouble thinking that through right now. Could you ask me again in a moment?";

const TECH_KEYWORDS: &[&str] = &[
    "code",
    "programming",
    "debug",
    "compile",
    "function",
    "api",
    "database",
    "javascript",
    "python",
    "rust",
    "typescript",
    "sql",
    "error message",
    "stack trace",
];

/// Specialist for programming and technical conversation.
pub struct TechnicalSpecialist {
    provider: Option<Arc<dyn AiProvider>>,
    timeout: Duration,
}

impl TechnicalSpecialist {
    pub fn new(provider: Option<Arc<dyn AiProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn matches(content: &str) -> bool {
        let content = content.to_lowercase();
        TECH_KEYWORDS.iter().any(|k| content.contains(k))
    }
}

#[async_trait]
impl Specialist for TechnicalSpecialist {
    fn name(&self) -> &'static str {
        "technical_specialist"
    }

    fn domain_affinity(&self) -> Domain {
        Domain::ProgrammingTechnical
    }

    fn can_handle(&self, turns: &[Turn]) -> bool {
        latest_user_turn(turns)
            .map(|t| Self::matches(&t.content))
            .unwrap_or(false)
    }

    async fn confidence(&self, turns: &[Turn]) -> f64 {
        match latest_user_turn(turns) {
            Some(turn) if Self::matches(&turn.content) => 0.85,
            Some(_) => 0.1,
            None => 0.0,
        }
    }

    async fn handle(&self, ctx: &TurnContext) -> Result<SpecialistReply, EngineError> {
        let Some(provider) = &self.provider else {
            return Ok(SpecialistReply::text(APOLOGY));
        };

        let request = ChatRequest::new()
            .with_system_prompt(PERSONA_PROMPT)
            .with_temperature(0.3)
            .with_max_tokens(600)
            .with_turns(&ctx.turns);

        match tokio::time::timeout(self.timeout, provider.complete(request)).await {
            Ok(Ok(response)) => Ok(SpecialistReply::text(response.content)),
            Ok(Err(err)) => {
                warn!(error = %err, "technical gateway call failed");
                Ok(SpecialistReply::text(APOLOGY))
            }
            Err(_) => {
                warn!("technical gateway call timed out");
                Ok(SpecialistReply::text(APOLOGY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiProvider;

    #[tokio::test]
    async fn programming_language_names_match() {
        let s = TechnicalSpecialist::new(
            Some(Arc::new(MockAiProvider::new())),
            Duration::from_secs(5),
        );
        assert!(s.can_handle(&[Turn::user("why does my rust borrow checker complain")]));
        assert!((s.confidence(&[Turn::user("help me debug this sql query")]).await - 0.85).abs() < f64::EPSILON);
        assert!(!s.can_handle(&[Turn::user("what should I cook tonight")]));
    }

    #[tokio::test]
    async fn no_provider_yields_apology() {
        let s = TechnicalSpecialist::new(None, Duration::from_secs(5));
        let ctx = TurnContext {
            turns: vec![Turn::user("explain async programming")],
            context_turn: None,
            owner: crate::domain::foundation::UserId::guest(),
        };
        assert_eq!(s.handle(&ctx).await.unwrap().content, APOLOGY);
    }
}
