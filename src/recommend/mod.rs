//! Crop recommendation strategies.
//!
//! Every strategy implements [`Recommender`]. The production path is the
//! [`RecommendationEngine`], which asks the model-backed recommender first and
//! falls back to the expert rules so a crop is always returned. The binary-code
//! and simple-rule strategies stay available behind the same trait for
//! comparison, but are never chained into the default path.

use crate::soil::SoilMetrics;
use serde::Serialize;
use std::fmt;
use tracing::debug;

pub mod binary_code;
pub mod catalog;
pub mod expert;
pub mod model;
pub mod simple_rule;

use binary_code::BinaryCodeRecommender;
use expert::ExpertRecommender;
use model::ModelRecommender;
use simple_rule::SimpleRuleRecommender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Model,
    Expert,
    BinaryCode,
    SimpleRule,
}

impl fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecommendationSource::Model => "model",
            RecommendationSource::Expert => "expert",
            RecommendationSource::BinaryCode => "binary_code",
            RecommendationSource::SimpleRule => "simple_rule",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub crop: String,
    /// Heuristic 0-100 support score; only model output is probability-backed.
    pub confidence: f64,
    pub source: RecommendationSource,
}

/// A strategy mapping a soil snapshot to a crop.
///
/// Returning `None` means the strategy has no answer for this snapshot.
pub trait Recommender: Send + Sync + fmt::Debug {
    fn source(&self) -> RecommendationSource;

    fn recommend(&self, metrics: &SoilMetrics) -> Option<Recommendation>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyOutcome {
    pub source: RecommendationSource,
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Default)]
pub struct RecommendationEngine {
    model: ModelRecommender,
    expert: ExpertRecommender,
}

impl RecommendationEngine {
    pub fn new(model: ModelRecommender) -> Self {
        Self {
            model,
            expert: ExpertRecommender::default(),
        }
    }

    /// Engine without a classifier; every answer comes from the expert rules.
    pub fn expert_only() -> Self {
        Self::new(ModelRecommender::unavailable())
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_available()
    }

    /// Model first, expert rules second. Never empty.
    pub fn recommend(&self, metrics: &SoilMetrics) -> Recommendation {
        if let Some(recommendation) = self.model.recommend(metrics) {
            return recommendation;
        }
        debug!("Model recommendation unavailable, using expert rules");
        Recommendation {
            crop: self.expert.best_crop(metrics).to_string(),
            confidence: 0.0,
            source: RecommendationSource::Expert,
        }
    }

    /// Run every strategy independently, in a fixed order.
    pub fn compare(&self, metrics: &SoilMetrics) -> Vec<StrategyOutcome> {
        let binary = BinaryCodeRecommender;
        let simple = SimpleRuleRecommender;
        let strategies: [&dyn Recommender; 4] = [&self.model, &self.expert, &binary, &simple];
        strategies
            .iter()
            .map(|strategy| StrategyOutcome {
                source: strategy.source(),
                recommendation: strategy.recommend(metrics),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::model::{ClassPrediction, Classifier, ClassifierError};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FixedLabel(&'static str);

    impl Classifier for FixedLabel {
        fn predict(&self, _features: &[f64; 5]) -> Result<ClassPrediction, ClassifierError> {
            Ok(ClassPrediction::Label(self.0.to_string()))
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Classifier for Broken {
        fn predict(&self, _features: &[f64; 5]) -> Result<ClassPrediction, ClassifierError> {
            Err(ClassifierError::Invalid("boom".to_string()))
        }
    }

    #[test]
    fn expert_only_engine_reports_expert_with_zero_confidence() {
        let engine = RecommendationEngine::expert_only();
        let metrics = SoilMetrics::new(100.0, 30.0, 120.0, 6.5, 65.0);

        let recommendation = engine.recommend(&metrics);

        assert_eq!(recommendation.source, RecommendationSource::Expert);
        assert_eq!(recommendation.confidence, 0.0);
        assert!(!engine.model_loaded());
    }

    #[test]
    fn model_answer_wins_when_available() {
        let engine = RecommendationEngine::new(ModelRecommender::new(Arc::new(FixedLabel("maize"))));
        let metrics = SoilMetrics::new(100.0, 30.0, 120.0, 6.5, 65.0);

        let recommendation = engine.recommend(&metrics);

        assert_eq!(recommendation.crop, "Corn");
        assert_eq!(recommendation.source, RecommendationSource::Model);
        assert_eq!(recommendation.confidence, model::DEFAULT_MODEL_CONFIDENCE);
    }

    #[test]
    fn failing_classifier_falls_back_to_expert() {
        let engine = RecommendationEngine::new(ModelRecommender::new(Arc::new(Broken)));

        let recommendation = engine.recommend(&SoilMetrics::disconnected());

        assert_eq!(recommendation.crop, "Rice");
        assert_eq!(recommendation.source, RecommendationSource::Expert);
        assert_eq!(recommendation.confidence, 0.0);
    }

    #[test]
    fn out_of_range_input_skips_model() {
        let engine = RecommendationEngine::new(ModelRecommender::new(Arc::new(FixedLabel("maize"))));
        let metrics = SoilMetrics::new(1200.0, 30.0, 120.0, 6.5, 65.0);

        let recommendation = engine.recommend(&metrics);

        assert_eq!(recommendation.source, RecommendationSource::Expert);
    }

    #[test]
    fn compare_runs_all_strategies_in_order() {
        let engine = RecommendationEngine::expert_only();
        let metrics = SoilMetrics::new(200.0, 50.0, 150.0, 6.5, 65.0);

        let outcomes = engine.compare(&metrics);

        let sources: Vec<_> = outcomes.iter().map(|o| o.source).collect();
        assert_eq!(
            sources,
            vec![
                RecommendationSource::Model,
                RecommendationSource::Expert,
                RecommendationSource::BinaryCode,
                RecommendationSource::SimpleRule,
            ]
        );
        assert!(outcomes[0].recommendation.is_none());
        assert!(outcomes[1].recommendation.is_some());
        assert_eq!(
            outcomes[2].recommendation.as_ref().map(|r| r.crop.as_str()),
            Some("TOMATOES")
        );
    }
}
