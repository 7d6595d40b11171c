//! Intent classifier.
//!
//! Delegates classification to the language-model gateway with a closed
//! label set and strict JSON output. Any failure - transport, timeout,
//! malformed JSON - degrades to the fallback analysis; classification never
//! aborts a turn.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::conversation::{latest_user_turn, Turn, TurnRole};
use crate::ports::{AiProvider, ChatRequest};

use super::json::extract_json_object;
use super::values::{Domain, IntentAnalysis, Sentiment};

const CLASSIFIER_PROMPT: &str = "You classify one chat message for a goal-coaching assistant.\n\
Respond with a JSON object only:\n\
{\"primary_intent\": \"<short phrase>\",\n \
\"domain\": \"goal_setting\" | \"task_management\" | \"fitness_health\" | \"programming_technical\" | \"general_chat\",\n \
\"sentiment\": \"positive\" | \"negative\" | \"neutral\" | \"confused\",\n \
\"confidence\": <number 0..1>}\n\
Pick exactly one domain and one sentiment. No prose.";

/// Classifier wire shape. Labels arrive as free text and are re-parsed into
/// the closed enums, so an off-list label degrades instead of erroring.
#[derive(Debug, Deserialize)]
struct WireAnalysis {
    #[serde(default)]
    primary_intent: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    sentiment: String,
    #[serde(default)]
    confidence: f64,
}

/// Maps the latest user turn (plus memory context) to an [`IntentAnalysis`].
pub struct IntentClassifier {
    provider: Option<Arc<dyn AiProvider>>,
    timeout: Duration,
}

impl IntentClassifier {
    /// Creates a classifier. Without a provider every turn classifies to the
    /// fallback analysis.
    pub fn new(provider: Option<Arc<dyn AiProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Classifies the latest user turn. `context_turn` is the rendered
    /// conversation-memory context, if any. Never fails.
    pub async fn classify(&self, turns: &[Turn], context_turn: Option<&Turn>) -> IntentAnalysis {
        let Some(provider) = &self.provider else {
            return IntentAnalysis::fallback();
        };
        // Only user speech drives classification; trailing assistant turns
        // are ignored.
        let Some(user_turn) = latest_user_turn(turns) else {
            return IntentAnalysis::fallback();
        };

        let mut request = ChatRequest::new()
            .with_system_prompt(CLASSIFIER_PROMPT)
            .with_json_mode()
            .with_temperature(0.0)
            .with_max_tokens(200);
        if let Some(context) = context_turn {
            request = request.with_message(TurnRole::System, context.content.clone());
        }
        request = request.with_message(TurnRole::User, user_turn.content.clone());

        let response = match tokio::time::timeout(self.timeout, provider.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(error = %err, "classifier gateway call failed, using fallback analysis");
                return IntentAnalysis::fallback();
            }
            Err(_) => {
                warn!("classifier gateway call timed out, using fallback analysis");
                return IntentAnalysis::fallback();
            }
        };

        match parse_analysis(&response.content) {
            Some(analysis) => {
                debug!(domain = analysis.domain.as_str(), confidence = analysis.confidence, "turn classified");
                analysis
            }
            None => {
                warn!("classifier returned unparsable output, using fallback analysis");
                IntentAnalysis::fallback()
            }
        }
    }
}

/// Parses classifier output, tolerating code fences and surrounding prose.
fn parse_analysis(content: &str) -> Option<IntentAnalysis> {
    let json = extract_json_object(content)?;
    let wire: WireAnalysis = serde_json::from_str(&json).ok()?;
    Some(IntentAnalysis {
        primary_intent: if wire.primary_intent.is_empty() {
            "unknown".to_string()
        } else {
            wire.primary_intent
        },
        domain: Domain::parse(&wire.domain),
        sentiment: Sentiment::parse(&wire.sentiment),
        confidence: wire.confidence.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAiProvider, MockError};

    fn classifier(provider: MockAiProvider) -> IntentClassifier {
        IntentClassifier::new(Some(Arc::new(provider)), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn parses_strict_json_labels() {
        let provider = MockAiProvider::new().with_response(
            r#"{"primary_intent":"set a strength goal","domain":"goal_setting","sentiment":"positive","confidence":0.92}"#,
        );
        let classifier = classifier(provider);

        let turns = vec![Turn::user("I want to bench press 225 lbs by end of year")];
        let analysis = classifier.classify(&turns, None).await;
        assert_eq!(analysis.domain, Domain::GoalSetting);
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert!(analysis.confidence > 0.9);
    }

    #[tokio::test]
    async fn malformed_output_degrades_to_fallback() {
        let classifier = classifier(MockAiProvider::new().with_response("not json at all"));
        let analysis = classifier.classify(&[Turn::user("hello")], None).await;
        assert_eq!(analysis.domain, Domain::GeneralChat);
        assert_eq!(analysis.confidence, 0.0);
    }

    #[tokio::test]
    async fn gateway_error_degrades_to_fallback() {
        let classifier =
            classifier(MockAiProvider::new().with_error(MockError::Unavailable("down".into())));
        let analysis = classifier.classify(&[Turn::user("hello")], None).await;
        assert_eq!(analysis, IntentAnalysis::fallback());
    }

    #[tokio::test]
    async fn no_user_turn_yields_fallback_without_gateway_call() {
        let provider = MockAiProvider::new();
        let classifier = IntentClassifier::new(
            Some(Arc::new(provider.clone())),
            Duration::from_secs(5),
        );
        let analysis = classifier.classify(&[Turn::assistant("hi")], None).await;
        assert_eq!(analysis, IntentAnalysis::fallback());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn code_fenced_json_is_recovered() {
        let classifier = classifier(MockAiProvider::new().with_response(
            "```json\n{\"primary_intent\":\"chat\",\"domain\":\"general_chat\",\"sentiment\":\"neutral\",\"confidence\":0.5}\n```",
        ));
        let analysis = classifier.classify(&[Turn::user("hey")], None).await;
        assert_eq!(analysis.domain, Domain::GeneralChat);
        assert_eq!(analysis.confidence, 0.5);
    }

    #[tokio::test]
    async fn off_list_labels_degrade_within_parse() {
        let classifier = classifier(MockAiProvider::new().with_response(
            r#"{"primary_intent":"weather","domain":"meteorology","sentiment":"stormy","confidence":1.4}"#,
        ));
        let analysis = classifier.classify(&[Turn::user("rain?")], None).await;
        assert_eq!(analysis.domain, Domain::GeneralChat);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.confidence, 1.0);
    }
}
