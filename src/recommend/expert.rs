//! Weighted-scoring rule engine over the crop catalog.
//!
//! Each crop earns 2 points per parameter inside its requirement range and 1
//! point when the value misses the range by at most [`NEAR_MISS_TOLERANCE`]
//! units. Scores are normalized to a percentage of the 10-point maximum; the
//! best crop is returned unless it scores under [`MIN_SCORE_PERCENT`], in which
//! case [`FALLBACK_CROP`] is returned.

use crate::recommend::catalog::{CROP_CATALOG, CropProfile};
use crate::recommend::{Recommendation, RecommendationSource, Recommender};
use crate::soil::{Parameter, SoilMetrics};
use serde::Serialize;

pub const IN_RANGE_POINTS: u32 = 2;
pub const NEAR_MISS_POINTS: u32 = 1;
pub const NEAR_MISS_TOLERANCE: f64 = 20.0;
pub const MIN_SCORE_PERCENT: f64 = 40.0;
pub const FALLBACK_CROP: &str = "Rice";

const MAX_POINTS: u32 = IN_RANGE_POINTS * Parameter::ALL.len() as u32;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropScore {
    pub crop: &'static str,
    pub points: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ExpertRecommender {
    catalog: &'static [CropProfile],
}

impl ExpertRecommender {
    pub fn new(catalog: &'static [CropProfile]) -> Self {
        Self { catalog }
    }

    /// Score every crop, in catalog order.
    pub fn scores(&self, metrics: &SoilMetrics) -> Vec<CropScore> {
        self.catalog
            .iter()
            .map(|profile| {
                let points = score_profile(profile, metrics);
                CropScore {
                    crop: profile.name,
                    points,
                    percent: points as f64 / MAX_POINTS as f64 * 100.0,
                }
            })
            .collect()
    }

    /// Highest strictly-greater score wins, so earlier catalog entries win ties.
    pub fn best(&self, metrics: &SoilMetrics) -> Option<CropScore> {
        let mut best: Option<CropScore> = None;
        for score in self.scores(metrics) {
            match &best {
                Some(current) if score.percent <= current.percent => {}
                _ => best = Some(score),
            }
        }
        best.filter(|score| score.percent >= MIN_SCORE_PERCENT)
    }

    pub fn best_crop(&self, metrics: &SoilMetrics) -> &'static str {
        self.best(metrics)
            .map(|score| score.crop)
            .unwrap_or(FALLBACK_CROP)
    }
}

impl Default for ExpertRecommender {
    fn default() -> Self {
        Self::new(&CROP_CATALOG)
    }
}

impl Recommender for ExpertRecommender {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::Expert
    }

    /// Reports the winning percentage as confidence; the floor fallback reports 0.
    fn recommend(&self, metrics: &SoilMetrics) -> Option<Recommendation> {
        let (crop, confidence) = match self.best(metrics) {
            Some(score) => (score.crop, score.percent),
            None => (FALLBACK_CROP, 0.0),
        };
        Some(Recommendation {
            crop: crop.to_string(),
            confidence,
            source: RecommendationSource::Expert,
        })
    }
}

fn score_profile(profile: &CropProfile, metrics: &SoilMetrics) -> u32 {
    Parameter::ALL
        .iter()
        .map(|parameter| {
            let range = profile.requirement(*parameter);
            let value = metrics.value(*parameter);
            if range.contains(value) {
                IN_RANGE_POINTS
            } else if range.near(value, NEAR_MISS_TOLERANCE) {
                NEAR_MISS_POINTS
            } else {
                0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::catalog::find_crop;

    #[test]
    fn all_zero_input_falls_back_to_rice() {
        let expert = ExpertRecommender::default();
        let metrics = SoilMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0);

        assert!(expert.best(&metrics).is_none());
        assert_eq!(expert.best_crop(&metrics), "Rice");
    }

    #[test]
    fn exact_profile_match_scores_one_hundred() {
        let expert = ExpertRecommender::default();
        // Inside Banana's ranges only.
        let metrics = SoilMetrics::new(250.0, 40.0, 500.0, 6.0, 80.0);

        let best = expert.best(&metrics).expect("banana should score");

        assert_eq!(best.crop, "Banana");
        assert_eq!(best.points, 10);
        assert_eq!(best.percent, 100.0);
    }

    #[test]
    fn ties_go_to_the_earliest_catalog_entry() {
        let expert = ExpertRecommender::default();
        // Lettuce, Mustasa, Bokchoy and Carrots all match fully; Lettuce is declared first.
        let metrics = SoilMetrics::new(100.0, 30.0, 120.0, 6.5, 75.0);

        let scores = expert.scores(&metrics);
        let full: Vec<_> = scores
            .iter()
            .filter(|score| score.points == 10)
            .map(|score| score.crop)
            .collect();

        assert!(full.len() > 1, "expected a tie, got {full:?}");
        assert_eq!(expert.best_crop(&metrics), full[0]);
        assert_eq!(expert.best_crop(&metrics), "Lettuce");
    }

    #[test]
    fn result_is_always_from_catalog_or_rice() {
        let expert = ExpertRecommender::default();
        for n in [0.0, 50.0, 120.0, 250.0, 900.0] {
            for ph in [0.0, 5.5, 6.5, 9.0, 14.0] {
                let metrics = SoilMetrics::new(n, n / 4.0, n * 1.2, ph, 65.0);
                let crop = expert.best_crop(&metrics);
                assert!(find_crop(crop).is_some(), "{crop} not in catalog");
            }
        }
    }

    #[test]
    fn near_miss_scores_one_point() {
        let profile = find_crop("Munggo").expect("munggo in catalog");
        // N 0 is 20 from 20, P 0 is 15 from 15, pH 0 within 20 of 6.0; K and humidity miss.
        let metrics = SoilMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0);

        assert_eq!(score_profile(profile, &metrics), 3);
    }

    #[test]
    fn recommender_reports_winning_percentage() {
        let expert = ExpertRecommender::default();
        let metrics = SoilMetrics::new(250.0, 40.0, 500.0, 6.0, 80.0);

        let recommendation = expert.recommend(&metrics).expect("expert is total");

        assert_eq!(recommendation.crop, "Banana");
        assert_eq!(recommendation.confidence, 100.0);
        assert_eq!(recommendation.source, RecommendationSource::Expert);
    }
}
