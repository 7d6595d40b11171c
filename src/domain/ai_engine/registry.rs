//! Specialist registry and confidence-based router.

use std::sync::Arc;

use tracing::debug;

use crate::domain::conversation::Turn;

use super::specialist::Specialist;
use super::values::IntentAnalysis;

/// Holds registered specialists and picks the best handler per turn.
///
/// Two-stage routing keeps model costs bounded: a cheap affinity/prefilter
/// pass selects candidates, then only the survivors are confidence-scored.
pub struct SpecialistRouter {
    specialists: Vec<Arc<dyn Specialist>>,
    threshold: f64,
}

impl SpecialistRouter {
    /// Creates a router with the given routing threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            specialists: Vec::new(),
            threshold,
        }
    }

    /// Registers a specialist. Registration order is the tie-break order.
    pub fn register(&mut self, specialist: Arc<dyn Specialist>) {
        self.specialists.push(specialist);
    }

    /// Selects the best specialist for this turn, or `None` when no
    /// candidate reaches the threshold (the caller falls back to general
    /// conversation).
    ///
    /// The threshold is inclusive on the specialist side; ties go to the
    /// first-registered specialist.
    pub async fn route(
        &self,
        turns: &[Turn],
        analysis: &IntentAnalysis,
    ) -> Option<Arc<dyn Specialist>> {
        let candidates: Vec<&Arc<dyn Specialist>> = self
            .specialists
            .iter()
            .filter(|s| s.domain_affinity() == analysis.domain || s.can_handle(turns))
            .collect();

        let mut best: Option<(Arc<dyn Specialist>, f64)> = None;
        for candidate in candidates {
            let score = candidate.confidence(turns).await;
            debug!(specialist = candidate.name(), score, "specialist scored");
            let beats_current = match &best {
                // Strictly-greater keeps the first-registered winner on ties.
                Some((_, best_score)) => score > *best_score,
                None => true,
            };
            if beats_current {
                best = Some((Arc::clone(candidate), score));
            }
        }

        match best {
            Some((specialist, score)) if score >= self.threshold => {
                debug!(specialist = specialist.name(), score, "routed to specialist");
                Some(specialist)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::ai_engine::errors::EngineError;
    use crate::domain::ai_engine::specialist::{SpecialistReply, TurnContext};
    use crate::domain::ai_engine::values::{Domain, Sentiment};

    struct FixedSpecialist {
        name: &'static str,
        affinity: Domain,
        can_handle: bool,
        score: f64,
    }

    #[async_trait]
    impl Specialist for FixedSpecialist {
        fn name(&self) -> &'static str {
            self.name
        }
        fn domain_affinity(&self) -> Domain {
            self.affinity
        }
        fn can_handle(&self, _turns: &[Turn]) -> bool {
            self.can_handle
        }
        async fn confidence(&self, _turns: &[Turn]) -> f64 {
            self.score
        }
        async fn handle(&self, _ctx: &TurnContext) -> Result<SpecialistReply, EngineError> {
            Ok(SpecialistReply::text("handled"))
        }
    }

    fn analysis(domain: Domain) -> IntentAnalysis {
        IntentAnalysis {
            primary_intent: "test".to_string(),
            domain,
            sentiment: Sentiment::Neutral,
            confidence: 0.8,
        }
    }

    fn turns() -> Vec<Turn> {
        vec![Turn::user("hello")]
    }

    #[tokio::test]
    async fn routes_to_highest_scoring_on_domain_match() {
        let mut router = SpecialistRouter::new(0.6);
        router.register(Arc::new(FixedSpecialist {
            name: "low",
            affinity: Domain::GoalSetting,
            can_handle: false,
            score: 0.7,
        }));
        router.register(Arc::new(FixedSpecialist {
            name: "high",
            affinity: Domain::GoalSetting,
            can_handle: false,
            score: 0.9,
        }));

        let chosen = router.route(&turns(), &analysis(Domain::GoalSetting)).await.unwrap();
        assert_eq!(chosen.name(), "high");
    }

    #[tokio::test]
    async fn threshold_is_inclusive_on_specialist_side() {
        let mut router = SpecialistRouter::new(0.6);
        router.register(Arc::new(FixedSpecialist {
            name: "exact",
            affinity: Domain::GoalSetting,
            can_handle: false,
            score: 0.6,
        }));

        assert!(router.route(&turns(), &analysis(Domain::GoalSetting)).await.is_some());
    }

    #[tokio::test]
    async fn below_threshold_falls_back_to_general() {
        let mut router = SpecialistRouter::new(0.6);
        router.register(Arc::new(FixedSpecialist {
            name: "weak",
            affinity: Domain::GoalSetting,
            can_handle: false,
            score: 0.59,
        }));

        assert!(router.route(&turns(), &analysis(Domain::GoalSetting)).await.is_none());
    }

    #[tokio::test]
    async fn off_domain_specialist_survives_via_can_handle() {
        let mut router = SpecialistRouter::new(0.6);
        router.register(Arc::new(FixedSpecialist {
            name: "mid_flow",
            affinity: Domain::GoalSetting,
            can_handle: true,
            score: 0.9,
        }));

        // Classifier saw "yes" and labeled it general chat, but the
        // specialist is mid-flow.
        let chosen = router.route(&turns(), &analysis(Domain::GeneralChat)).await.unwrap();
        assert_eq!(chosen.name(), "mid_flow");
    }

    #[tokio::test]
    async fn off_domain_without_prefilter_is_never_scored() {
        let mut router = SpecialistRouter::new(0.0);
        router.register(Arc::new(FixedSpecialist {
            name: "elsewhere",
            affinity: Domain::ProgrammingTechnical,
            can_handle: false,
            score: 1.0,
        }));

        assert!(router.route(&turns(), &analysis(Domain::GoalSetting)).await.is_none());
    }

    #[tokio::test]
    async fn ties_go_to_first_registered() {
        let mut router = SpecialistRouter::new(0.6);
        router.register(Arc::new(FixedSpecialist {
            name: "first",
            affinity: Domain::GoalSetting,
            can_handle: false,
            score: 0.8,
        }));
        router.register(Arc::new(FixedSpecialist {
            name: "second",
            affinity: Domain::GoalSetting,
            can_handle: false,
            score: 0.8,
        }));

        let chosen = router.route(&turns(), &analysis(Domain::GoalSetting)).await.unwrap();
        assert_eq!(chosen.name(), "first");
    }
}
