//! Entity extraction.
//!
//! Delegates slot extraction to the gateway with a fixed JSON schema prompt
//! and merges what comes back into the running draft. Extraction failures
//! are recoverable: the specialist re-asks the user instead of aborting.
//! When the gateway cannot be reached at all, goal extraction falls back to
//! a deterministic scan for a measurable target in the user's own words.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::domain::conversation::{Turn, TurnRole};
use crate::domain::goal::GoalDraft;
use crate::domain::task::TaskDraft;
use crate::ports::{AiProvider, ChatRequest};

use super::errors::EngineError;
use super::json::extract_json_object;

const GOAL_SCHEMA_PROMPT: &str = "Extract goal details from the user's message.\n\
Respond with a JSON object only, using null for anything not mentioned:\n\
{\"title\": <string|null>, \"category\": \"career\"|\"health\"|\"fitness\"|\"personal\"|\"financial\"|\"learning\"|null,\n \
\"deadline\": <ISO date string or the user's phrasing, or null>, \"description\": <string|null>,\n \
\"priority\": \"low\"|\"medium\"|\"high\"|null, \"confidence\": <number 0..1>}\n\
The title should be a short imperative phrase with any measurable target kept verbatim. No prose.";

const TASK_SCHEMA_PROMPT: &str = "Extract task details from the user's message.\n\
Respond with a JSON object only, using null for anything not mentioned:\n\
{\"title\": <string|null>, \"due_date\": <ISO date string or the user's phrasing, or null>,\n \
\"description\": <string|null>, \"priority\": \"low\"|\"medium\"|\"high\"|null,\n \
\"goal_title\": <title of a goal the user wants this attached to, or null>, \"confidence\": <number 0..1>}\n\
No prose.";

const CONFIRMATION_PROMPT: &str = "The assistant asked the user to confirm a pending item. \
Decide whether the user's reply is a confirmation.\n\
Respond with a JSON object only: {\"confirmed\": <bool>, \"confidence\": <number 0..1>}";

#[derive(Debug, Deserialize)]
struct WireConfirmation {
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    confidence: f64,
}

/// Why a structured gateway call produced no JSON.
enum CallError {
    /// No provider, timeout, or transport failure: the gateway never
    /// answered.
    Unavailable(String),
    /// The gateway answered but the output carried no usable JSON object.
    Malformed(String),
}

impl From<CallError> for EngineError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Unavailable(msg) | CallError::Malformed(msg) => {
                EngineError::Extraction(msg)
            }
        }
    }
}

/// Gateway-backed slot extraction for goal and task drafts.
pub struct EntityExtractor {
    provider: Option<Arc<dyn AiProvider>>,
    timeout: Duration,
}

impl EntityExtractor {
    /// Creates an extractor. Without a provider every extraction fails
    /// recoverably and the specialist falls back to asking directly.
    pub fn new(provider: Option<Arc<dyn AiProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Extracts goal fields from the latest user turn.
    ///
    /// When the gateway is unreachable the deterministic metric scan takes
    /// over; a reachable gateway that returns junk still errors, so the
    /// specialist re-asks rather than guessing over a live model.
    pub async fn extract_goal(
        &self,
        context_turn: Option<&Turn>,
        user_content: &str,
    ) -> Result<GoalDraft, EngineError> {
        let json = match self
            .structured_call(GOAL_SCHEMA_PROMPT, context_turn, user_content)
            .await
        {
            Ok(json) => json,
            Err(CallError::Unavailable(msg)) => {
                return metric_goal_scan(user_content)
                    .ok_or(EngineError::Extraction(msg));
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&json)
            .map_err(|e| EngineError::Extraction(format!("goal fields unparsable: {e}")))
    }

    /// Extracts task fields from the latest user turn.
    pub async fn extract_task(
        &self,
        context_turn: Option<&Turn>,
        user_content: &str,
    ) -> Result<TaskDraft, EngineError> {
        let json = self
            .structured_call(TASK_SCHEMA_PROMPT, context_turn, user_content)
            .await
            .map_err(EngineError::from)?;
        serde_json::from_str(&json)
            .map_err(|e| EngineError::Extraction(format!("task fields unparsable: {e}")))
    }

    /// Semantic confirmation check, used only when the literal detector is
    /// inconclusive. Accepts only a confident yes; anything else - including
    /// a low-confidence yes or any failure - is ambiguous.
    pub async fn semantic_confirmation(
        &self,
        assistant_question: &str,
        user_reply: &str,
        threshold: f64,
    ) -> Result<bool, EngineError> {
        let content = format!("ASSISTANT ASKED: {assistant_question}\nUSER REPLIED: {user_reply}");
        let json = self
            .structured_call(CONFIRMATION_PROMPT, None, &content)
            .await
            .map_err(EngineError::from)?;
        let wire: WireConfirmation = serde_json::from_str(&json)
            .map_err(|e| EngineError::Extraction(format!("confirmation unparsable: {e}")))?;
        Ok(wire.confirmed && wire.confidence > threshold)
    }

    async fn structured_call(
        &self,
        schema_prompt: &str,
        context_turn: Option<&Turn>,
        user_content: &str,
    ) -> Result<String, CallError> {
        let Some(provider) = &self.provider else {
            return Err(CallError::Unavailable(
                "no extraction provider configured".to_string(),
            ));
        };

        let mut request = ChatRequest::new()
            .with_system_prompt(schema_prompt)
            .with_json_mode()
            .with_temperature(0.0)
            .with_max_tokens(300);
        if let Some(context) = context_turn {
            request = request.with_message(TurnRole::System, context.content.clone());
        }
        request = request.with_message(TurnRole::User, user_content.to_string());

        let response = tokio::time::timeout(self.timeout, provider.complete(request))
            .await
            .map_err(|_| {
                warn!("extraction gateway call timed out");
                CallError::Unavailable("extraction timed out".to_string())
            })?
            .map_err(|err| {
                warn!(error = %err, "extraction gateway call failed");
                CallError::Unavailable(err.to_string())
            })?;

        extract_json_object(&response.content).ok_or_else(|| {
            CallError::Malformed("no JSON object in extraction output".to_string())
        })
    }
}

const METRIC_UNITS: &[&str] = &[
    "lbs", "lb", "pounds", "kg", "kilos", "miles", "mile", "km", "minutes", "hours", "reps",
];

/// Last-resort goal scan when the gateway cannot be reached: a number next
/// to a known unit ("bench press 225 lbs", "run 10 km") is enough to seed a
/// draft from the user's own phrasing.
fn metric_goal_scan(user_content: &str) -> Option<GoalDraft> {
    let lowered = user_content.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == ',' || c == '!' || c == '.')
        .filter(|t| !t.is_empty())
        .collect();

    let mut has_metric = false;
    for (i, token) in tokens.iter().enumerate() {
        let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            continue;
        }
        let suffix = &token[digits.len()..];
        if METRIC_UNITS.contains(&suffix)
            || tokens.get(i + 1).is_some_and(|t| METRIC_UNITS.contains(t))
        {
            has_metric = true;
            break;
        }
    }
    if !has_metric {
        return None;
    }

    Some(GoalDraft {
        title: Some(strip_commitment_prefix(user_content)),
        category: Some("fitness".to_string()),
        confidence: Some(0.4),
        ..GoalDraft::default()
    })
}

/// Turns "I want to bench press 225 lbs" into "Bench press 225 lbs".
fn strip_commitment_prefix(content: &str) -> String {
    let trimmed = content.trim();
    let lowered = trimmed.to_lowercase();
    for prefix in ["i want to ", "i'd like to ", "i aim to ", "my goal is to "] {
        if lowered.starts_with(prefix) && trimmed.is_char_boundary(prefix.len()) {
            let rest = trimmed[prefix.len()..].trim();
            let mut chars = rest.chars();
            return match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => rest.to_string(),
            };
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAiProvider, MockError};

    fn extractor(provider: MockAiProvider) -> EntityExtractor {
        EntityExtractor::new(Some(Arc::new(provider)), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn goal_fields_parse_with_nulls() {
        let extractor = extractor(MockAiProvider::new().with_response(
            r#"{"title":"Bench press 225 lbs","category":"fitness","deadline":null,"description":null,"priority":null,"confidence":0.9}"#,
        ));
        let draft = extractor
            .extract_goal(None, "I want to bench press 225 lbs")
            .await
            .unwrap();
        assert_eq!(draft.title.as_deref(), Some("Bench press 225 lbs"));
        assert_eq!(draft.category.as_deref(), Some("fitness"));
        assert!(draft.deadline.is_none());
    }

    #[tokio::test]
    async fn unparsable_extraction_is_recoverable() {
        let extractor = extractor(MockAiProvider::new().with_response("title: bench press"));
        let err = extractor.extract_goal(None, "whatever").await.unwrap_err();
        assert!(matches!(err, EngineError::Extraction(_)));
    }

    #[tokio::test]
    async fn gateway_failure_maps_to_extraction_error() {
        let extractor =
            extractor(MockAiProvider::new().with_error(MockError::Network("reset".into())));
        let err = extractor.extract_task(None, "add a task").await.unwrap_err();
        assert!(matches!(err, EngineError::Extraction(_)));
    }

    #[tokio::test]
    async fn missing_provider_is_extraction_error() {
        let extractor = EntityExtractor::new(None, Duration::from_secs(5));
        assert!(extractor.extract_goal(None, "x").await.is_err());
    }

    #[tokio::test]
    async fn offline_gateway_falls_back_to_metric_scan() {
        let extractor = EntityExtractor::new(None, Duration::from_secs(5));
        let draft = extractor
            .extract_goal(None, "I want to bench press 225 lbs by end of year")
            .await
            .unwrap();
        assert_eq!(
            draft.title.as_deref(),
            Some("Bench press 225 lbs by end of year")
        );
        assert_eq!(draft.category.as_deref(), Some("fitness"));
        assert!(draft.deadline.is_none());
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_metric_scan() {
        let extractor =
            extractor(MockAiProvider::new().with_error(MockError::Unavailable("down".into())));
        let draft = extractor
            .extract_goal(None, "run 10 km without stopping")
            .await
            .unwrap();
        assert_eq!(draft.title.as_deref(), Some("run 10 km without stopping"));
    }

    #[tokio::test]
    async fn metric_scan_requires_a_measurable_target() {
        let extractor = EntityExtractor::new(None, Duration::from_secs(5));
        assert!(extractor
            .extract_goal(None, "I want to be happier")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn junk_output_from_a_live_gateway_still_reasks() {
        // The gateway answered, so the scan must not take over; the
        // specialist re-asks instead.
        let extractor = extractor(MockAiProvider::new().with_response("not json"));
        assert!(extractor
            .extract_goal(None, "I want to bench press 225 lbs")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn semantic_confirmation_requires_confidence_above_threshold() {
        let extractor = extractor(
            MockAiProvider::new()
                .with_response(r#"{"confirmed":true,"confidence":0.9}"#)
                .with_response(r#"{"confirmed":true,"confidence":0.5}"#)
                .with_response(r#"{"confirmed":false,"confidence":0.95}"#),
        );
        assert!(extractor
            .semantic_confirmation("Does this look right?", "go for it", 0.6)
            .await
            .unwrap());
        assert!(!extractor
            .semantic_confirmation("Does this look right?", "maybe", 0.6)
            .await
            .unwrap());
        assert!(!extractor
            .semantic_confirmation("Does this look right?", "hold on", 0.6)
            .await
            .unwrap());
    }
}
