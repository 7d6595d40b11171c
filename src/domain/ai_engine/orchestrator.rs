//! Conversation engine: the per-turn orchestration pipeline.
//!
//! One inbound turn runs sequentially: memory update, classification,
//! routing, handling, memory update. A per-conversation lock holds for the
//! whole pipeline, so turns on one conversation never interleave; different
//! conversations are isolated by the keyed memory registry and run
//! concurrently. Long-term memory writes are fire-and-forget: failures are
//! logged, never surfaced.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::domain::conversation::{MemoryRegistry, Turn};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{AiProvider, MemoryStore, PersistenceGateway};

use super::classifier::IntentClassifier;
use super::executor::ActionExecutor;
use super::extraction::EntityExtractor;
use super::general::{GeneralHandler, GENERAL_HANDLER_NAME};
use super::registry::SpecialistRouter;
use super::specialist::TurnContext;
use super::specialists::{FitnessSpecialist, GoalSpecialist, TaskSpecialist, TechnicalSpecialist};
use super::values::TurnOutcome;

/// Assembles a [`ConversationEngine`] from its collaborators.
///
/// Providers are optional: without a chat provider conversational handlers
/// apologize, without an extraction provider slot-filling re-asks. The
/// persistence gateway is the only required collaborator.
pub struct EngineBuilder {
    persistence: Arc<dyn PersistenceGateway>,
    chat_provider: Option<Arc<dyn AiProvider>>,
    extraction_provider: Option<Arc<dyn AiProvider>>,
    memory_store: Option<Arc<dyn MemoryStore>>,
    config: EngineConfig,
    gateway_timeout: Duration,
    model_actions_enabled: bool,
}

impl EngineBuilder {
    pub fn new(persistence: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            persistence,
            chat_provider: None,
            extraction_provider: None,
            memory_store: None,
            config: EngineConfig::default(),
            gateway_timeout: Duration::from_secs(30),
            model_actions_enabled: false,
        }
    }

    /// Provider for conversational replies.
    pub fn with_chat_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.chat_provider = Some(provider);
        self
    }

    /// Provider for structured extraction and classification.
    pub fn with_extraction_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.extraction_provider = Some(provider);
        self
    }

    /// Long-term memory store (optional; writes are best-effort).
    pub fn with_memory_store(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.memory_store = Some(store);
        self
    }

    /// Engine thresholds and memory capacity.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Timeout applied to every gateway call.
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Enables the model-assisted action tier.
    pub fn with_model_actions(mut self, enabled: bool) -> Self {
        self.model_actions_enabled = enabled;
        self
    }

    /// Builds the engine with the standard specialist set registered in
    /// deterministic order: goal, task, fitness, technical.
    pub fn build(self) -> ConversationEngine {
        let extractor = Arc::new(EntityExtractor::new(
            self.extraction_provider.clone(),
            self.gateway_timeout,
        ));
        let executor = Arc::new(ActionExecutor::new(
            self.persistence.clone(),
            self.extraction_provider.clone(),
            self.model_actions_enabled,
            self.gateway_timeout,
        ));

        let confirmation_threshold = f64::from(self.config.confirmation_threshold);
        let mut router = SpecialistRouter::new(f64::from(self.config.routing_threshold));
        router.register(Arc::new(GoalSpecialist::new(
            extractor.clone(),
            executor.clone(),
            confirmation_threshold,
        )));
        router.register(Arc::new(TaskSpecialist::new(
            extractor,
            executor,
            confirmation_threshold,
        )));
        router.register(Arc::new(FitnessSpecialist::new(
            self.chat_provider.clone(),
            self.gateway_timeout,
        )));
        router.register(Arc::new(TechnicalSpecialist::new(
            self.extraction_provider.clone(),
            self.gateway_timeout,
        )));

        ConversationEngine {
            memory: MemoryRegistry::new(self.config.memory_capacity),
            locks: TurnLocks::new(),
            classifier: IntentClassifier::new(
                self.extraction_provider.clone(),
                self.gateway_timeout,
            ),
            router,
            general: GeneralHandler::new(
                self.chat_provider,
                self.persistence,
                self.memory_store.clone(),
                self.gateway_timeout,
            ),
            memory_store: self.memory_store,
        }
    }
}

/// Per-conversation pipeline locks, keyed like the memory registry.
///
/// Two in-flight turns on one conversation would both snapshot the
/// transcript before either appended its reply, and a confirmation could
/// persist twice. Holding the conversation's lock across the whole pipeline
/// rules that out without serializing unrelated conversations.
struct TurnLocks {
    inner: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl TurnLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn for_conversation(&self, id: ConversationId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

/// The orchestration entry point.
pub struct ConversationEngine {
    memory: MemoryRegistry,
    locks: TurnLocks,
    classifier: IntentClassifier,
    router: SpecialistRouter,
    general: GeneralHandler,
    memory_store: Option<Arc<dyn MemoryStore>>,
}

impl ConversationEngine {
    /// Processes one inbound user turn and returns the assistant's reply
    /// with handler metadata. Never fails: every failure inside the
    /// pipeline degrades to a conversational response.
    pub async fn process_turn(
        &self,
        conversation_id: ConversationId,
        owner: &UserId,
        user_turn: Turn,
    ) -> TurnOutcome {
        let lock = self.locks.for_conversation(conversation_id).await;
        let _turn_guard = lock.lock().await;

        self.memory.update(conversation_id, &[user_turn.clone()]).await;
        let snapshot = self.memory.snapshot(conversation_id).await;
        let context_turn = self.memory.context_turn(conversation_id).await;

        let analysis = self.classifier.classify(&snapshot, context_turn.as_ref()).await;

        let ctx = TurnContext {
            turns: snapshot.clone(),
            context_turn,
            owner: owner.clone(),
        };

        let (reply, handler) = match self.router.route(&snapshot, &analysis).await {
            Some(specialist) => match specialist.handle(&ctx).await {
                Ok(reply) => (reply, specialist.name()),
                Err(err) => {
                    // A specialist error never crosses into the caller; the
                    // general handler produces the degraded reply.
                    warn!(specialist = specialist.name(), error = %err, "specialist failed, degrading to general chat");
                    (
                        self.general.handle(&ctx, analysis.sentiment).await,
                        GENERAL_HANDLER_NAME,
                    )
                }
            },
            None => (
                self.general.handle(&ctx, analysis.sentiment).await,
                GENERAL_HANDLER_NAME,
            ),
        };

        let assistant_turn = Turn::assistant(reply.content.clone());
        self.memory.update(conversation_id, &[assistant_turn.clone()]).await;

        self.remember(owner, &user_turn, &assistant_turn);

        info!(
            handler,
            domain = analysis.domain.as_str(),
            entity_created = reply.entity.is_some(),
            "turn processed"
        );

        TurnOutcome {
            assistant_turn,
            handler: handler.to_string(),
            entity: reply.entity,
        }
    }

    /// Fire-and-forget long-term memory writes. Store failures are logged
    /// and never block or fail the turn.
    fn remember(&self, owner: &UserId, user_turn: &Turn, assistant_turn: &Turn) {
        let Some(store) = &self.memory_store else {
            return;
        };

        for (role, content) in [
            ("user", user_turn.content.clone()),
            ("assistant", assistant_turn.content.clone()),
        ] {
            let store = store.clone();
            let owner = owner.clone();
            tokio::spawn(async move {
                let metadata = HashMap::from([("role".to_string(), role.to_string())]);
                if let Err(err) = store.store(&owner, &content, metadata).await {
                    warn!(error = %err, "long-term memory write failed");
                }
            });
        }
    }
}
