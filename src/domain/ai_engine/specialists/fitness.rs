//! Fitness specialist: persona-driven coaching chat.
//!
//! No slot-filling flow here; the specialist answers directly with a
//! fitness-coach persona. Confidence is tiered on keyword strength so the
//! goal specialist's explicit-goal score outranks it when the user is
//! setting a fitness goal rather than asking a fitness question.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::conversation::{latest_user_turn, Turn};
use crate::ports::{AiProvider, ChatRequest};

use super::super::errors::EngineError;
use super::super::specialist::{Specialist, SpecialistReply, TurnContext};
use super::super::values::Domain;

const PERSONA_PROMPT: &str = "You are a supportive, practical fitness coach inside a goal-coaching \
assistant. Give specific, safe advice on training, recovery, and nutrition. Keep replies short and \
conversational. If the user wants to commit to a target, suggest phrasing it as a goal.";

const APOLOGY: &str =
    "I'm sorry, I'm having trouble thinking that through right now. Could you ask me again in a moment?";

/// Strong signals: the user is asking about training itself.
const STRONG_KEYWORDS: &[&str] = &[
    "workout", "exercise", "gym", "training plan", "bench press", "squat", "deadlift", "cardio",
];

/// Medium signals: health-adjacent topics.
const MEDIUM_KEYWORDS: &[&str] = &[
    "fitness", "running", "muscle", "stretching", "protein", "calories", "weight loss",
];

/// Weak signals: wellbeing words that often appear in general chat.
const WEAK_KEYWORDS: &[&str] = &["healthy", "health", "sleep", "energy", "diet"];

/// Specialist for fitness and health conversation.
pub struct FitnessSpecialist {
    provider: Option<Arc<dyn AiProvider>>,
    timeout: Duration,
}

impl FitnessSpecialist {
    pub fn new(provider: Option<Arc<dyn AiProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    fn score(content: &str) -> f64 {
        let content = content.to_lowercase();
        if STRONG_KEYWORDS.iter().any(|k| content.contains(k)) {
            0.9
        } else if MEDIUM_KEYWORDS.iter().any(|k| content.contains(k)) {
            0.7
        } else if WEAK_KEYWORDS.iter().any(|k| content.contains(k)) {
            0.4
        } else {
            0.1
        }
    }
}

#[async_trait]
impl Specialist for FitnessSpecialist {
    fn name(&self) -> &'static str {
        "fitness_specialist"
    }

    fn domain_affinity(&self) -> Domain {
        Domain::FitnessHealth
    }

    fn can_handle(&self, turns: &[Turn]) -> bool {
        latest_user_turn(turns)
            .map(|t| Self::score(&t.content) >= 0.7)
            .unwrap_or(false)
    }

    async fn confidence(&self, turns: &[Turn]) -> f64 {
        latest_user_turn(turns)
            .map(|t| Self::score(&t.content))
            .unwrap_or(0.0)
    }

    async fn handle(&self, ctx: &TurnContext) -> Result<SpecialistReply, EngineError> {
        let Some(provider) = &self.provider else {
            return Ok(SpecialistReply::text(APOLOGY));
        };

        let request = ChatRequest::new()
            .with_system_prompt(PERSONA_PROMPT)
            .with_temperature(0.7)
            .with_max_tokens(400)
            .with_turns(&ctx.turns);

        match tokio::time::timeout(self.timeout, provider.complete(request)).await {
            Ok(Ok(response)) => Ok(SpecialistReply::text(response.content)),
            Ok(Err(err)) => {
                warn!(error = %err, "fitness gateway call failed");
                Ok(SpecialistReply::text(APOLOGY))
            }
            Err(_) => {
                warn!("fitness gateway call timed out");
                Ok(SpecialistReply::text(APOLOGY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAiProvider, MockError};

    fn specialist(provider: MockAiProvider) -> FitnessSpecialist {
        FitnessSpecialist::new(Some(Arc::new(provider)), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn keyword_tiers_score_as_expected() {
        let s = specialist(MockAiProvider::new());
        assert_eq!(s.confidence(&[Turn::user("plan my gym workout")]).await, 0.9);
        assert_eq!(s.confidence(&[Turn::user("how much protein do I need")]).await, 0.7);
        assert_eq!(s.confidence(&[Turn::user("I want to be more healthy")]).await, 0.4);
        assert_eq!(s.confidence(&[Turn::user("tell me a story")]).await, 0.1);
    }

    #[tokio::test]
    async fn weak_signals_do_not_pass_prefilter() {
        let s = specialist(MockAiProvider::new());
        assert!(s.can_handle(&[Turn::user("leg day workout ideas?")]));
        assert!(!s.can_handle(&[Turn::user("I slept badly")]));
    }

    #[tokio::test]
    async fn gateway_failure_yields_apology_not_error() {
        let s = specialist(MockAiProvider::new().with_error(MockError::RateLimited));
        let ctx = TurnContext {
            turns: vec![Turn::user("best squat form?")],
            context_turn: None,
            owner: crate::domain::foundation::UserId::guest(),
        };
        let reply = s.handle(&ctx).await.unwrap();
        assert_eq!(reply.content, APOLOGY);
    }
}
