//! General conversation handler - the default when no specialist claims a
//! turn.
//!
//! Builds a system prompt from static persona text plus a dynamic
//! user-context block (name, active goals, upcoming tasks, recent activity,
//! recalled long-term memories; every section omitted when absent) and calls
//! the chat gateway. Gateway failure yields a fixed apology: the user always
//! gets some response.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::conversation::latest_user_turn;
use crate::domain::foundation::UserId;
use crate::ports::{AiProvider, ChatRequest, MemoryStore, PersistenceGateway};

use super::specialist::{SpecialistReply, TurnContext};
use super::values::Sentiment;

const PERSONA_PROMPT: &str = "You are Aurelius, a warm and candid goal-coaching assistant. \
You help people set goals, break them into tasks, and stay accountable, but you are also good \
company for ordinary conversation. Be concise and concrete; never invent facts about the user.";

const APOLOGY: &str =
    "I'm sorry, I'm having a little trouble responding right now. Could you say that again in a moment?";

const MAX_CONTEXT_GOALS: usize = 5;
const MAX_CONTEXT_TASKS: usize = 10;
const MAX_CONTEXT_LOGS: usize = 5;
const MAX_RECALLED_MEMORIES: usize = 3;

/// Handler name reported in turn outcomes.
pub const GENERAL_HANDLER_NAME: &str = "general_conversation";

/// Default conversational handler.
pub struct GeneralHandler {
    provider: Option<Arc<dyn AiProvider>>,
    persistence: Arc<dyn PersistenceGateway>,
    memory: Option<Arc<dyn MemoryStore>>,
    timeout: Duration,
}

impl GeneralHandler {
    pub fn new(
        provider: Option<Arc<dyn AiProvider>>,
        persistence: Arc<dyn PersistenceGateway>,
        memory: Option<Arc<dyn MemoryStore>>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            persistence,
            memory,
            timeout,
        }
    }

    /// Best-effort semantic recall keyed to the latest user turn. A failed
    /// query or an empty result just omits the section.
    async fn recalled_memories(&self, ctx: &TurnContext) -> Option<String> {
        let store = self.memory.as_ref()?;
        let query = latest_user_turn(&ctx.turns)?;
        let records = match store
            .query(&ctx.owner, &query.content, MAX_RECALLED_MEMORIES)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "memory recall failed, continuing without it");
                return None;
            }
        };
        if records.is_empty() {
            return None;
        }
        let lines: Vec<String> = records.iter().map(|r| format!("- {}", r.text)).collect();
        Some(format!(
            "Things the user has said before that may be relevant:\n{}",
            lines.join("\n")
        ))
    }

    /// Renders the dynamic user-context block. Lookups are best-effort:
    /// a failed section is simply omitted.
    async fn user_context_block(&self, owner: &UserId) -> String {
        let mut sections = Vec::new();

        if let Ok(Some(name)) = self.persistence.display_name(owner).await {
            sections.push(format!("The user's name is {name}."));
        }

        if let Ok(goals) = self.persistence.find_goals_by_owner(owner).await {
            if !goals.is_empty() {
                let mut sorted = goals;
                sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
                let lines: Vec<String> = sorted
                    .iter()
                    .take(MAX_CONTEXT_GOALS)
                    .map(|g| format!("- {} ({}% done, due {})", g.title, g.progress, g.deadline))
                    .collect();
                sections.push(format!("Active goals:\n{}", lines.join("\n")));
            }
        }

        if let Ok(tasks) = self.persistence.find_tasks_by_owner(owner).await {
            let open: Vec<String> = tasks
                .iter()
                .filter(|t| !t.completed)
                .take(MAX_CONTEXT_TASKS)
                .map(|t| format!("- {} (due {})", t.title, t.due_date))
                .collect();
            if !open.is_empty() {
                sections.push(format!("Upcoming tasks:\n{}", open.join("\n")));
            }
        }

        if let Ok(logs) = self.persistence.recent_logs(owner, MAX_CONTEXT_LOGS).await {
            if !logs.is_empty() {
                let lines: Vec<String> = logs.iter().map(|l| format!("- {l}")).collect();
                sections.push(format!("Recent activity:\n{}", lines.join("\n")));
            }
        }

        sections.join("\n\n")
    }

    /// Small tone adjustment driven by the classified sentiment.
    fn tone_hint(sentiment: Sentiment) -> Option<&'static str> {
        match sentiment {
            Sentiment::Negative => {
                Some("The user seems frustrated or down; acknowledge that before advising.")
            }
            Sentiment::Confused => {
                Some("The user seems confused; explain simply and check understanding.")
            }
            Sentiment::Positive | Sentiment::Neutral => None,
        }
    }

    /// Produces the general reply for this turn. Never fails.
    pub async fn handle(&self, ctx: &TurnContext, sentiment: Sentiment) -> SpecialistReply {
        let Some(provider) = &self.provider else {
            return SpecialistReply::text(APOLOGY);
        };

        let mut system_prompt = PERSONA_PROMPT.to_string();
        let context = self.user_context_block(&ctx.owner).await;
        if !context.is_empty() {
            system_prompt.push_str("\n\n");
            system_prompt.push_str(&context);
        }
        if let Some(recalled) = self.recalled_memories(ctx).await {
            system_prompt.push_str("\n\n");
            system_prompt.push_str(&recalled);
        }
        if let Some(hint) = Self::tone_hint(sentiment) {
            system_prompt.push_str("\n\n");
            system_prompt.push_str(hint);
        }

        let request = ChatRequest::new()
            .with_system_prompt(system_prompt)
            .with_temperature(0.8)
            .with_max_tokens(500)
            .with_turns(&ctx.turns);

        match tokio::time::timeout(self.timeout, provider.complete(request)).await {
            Ok(Ok(response)) => SpecialistReply::text(response.content),
            Ok(Err(err)) => {
                warn!(error = %err, "general chat gateway call failed");
                SpecialistReply::text(APOLOGY)
            }
            Err(_) => {
                warn!("general chat gateway call timed out");
                SpecialistReply::text(APOLOGY)
            }
        }
    }
}
