use crate::recommend::{Recommendation, RecommendationSource, Recommender};
use crate::soil::SoilMetrics;

/// Rule-of-five recommender from the farmer-facing dashboard: checks pH, then
/// humidity, then nitrogen, first match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleRuleRecommender;

impl SimpleRuleRecommender {
    pub fn crop(&self, metrics: &SoilMetrics) -> &'static str {
        if metrics.ph < 6.0 {
            "Potatoes"
        } else if metrics.ph > 7.5 {
            "Onion"
        } else if metrics.humidity > 70.0 {
            "Rice"
        } else if metrics.n > 100.0 {
            "Corn"
        } else {
            "Tomatoes"
        }
    }
}

impl Recommender for SimpleRuleRecommender {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::SimpleRule
    }

    fn recommend(&self, metrics: &SoilMetrics) -> Option<Recommendation> {
        Some(Recommendation {
            crop: self.crop(metrics).to_string(),
            confidence: 0.0,
            source: RecommendationSource::SimpleRule,
        })
    }
}
