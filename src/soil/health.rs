use crate::soil::thresholds::{SOIL_THRESHOLDS, ThresholdTable};
use crate::soil::{Parameter, SoilMetrics};

pub const OPTIMAL_SCORE: f64 = 100.0;
pub const NEAR_OPTIMAL_SCORE: f64 = 80.0;
pub const POOR_SCORE: f64 = 30.0;
pub const UNKNOWN_PARAMETER_SCORE: f64 = 50.0;
/// Distance outside the optimal band that still counts as near-optimal.
pub const NEAR_OPTIMAL_MARGIN: f64 = 20.0;

#[derive(Debug, Clone, Copy)]
pub struct HealthScorer {
    table: ThresholdTable,
}

impl HealthScorer {
    pub fn new(table: ThresholdTable) -> Self {
        Self { table }
    }

    /// Mean of the five per-parameter scores, always within `[0, 100]`.
    pub fn score(&self, metrics: &SoilMetrics) -> f64 {
        let total: f64 = Parameter::ALL
            .iter()
            .map(|parameter| self.parameter_score(metrics.value(*parameter), *parameter))
            .sum();
        total / Parameter::ALL.len() as f64
    }

    pub fn parameter_score(&self, value: f64, parameter: Parameter) -> f64 {
        let band = self.table.band(parameter);
        if band.is_optimal(value) {
            OPTIMAL_SCORE
        } else if band.optimal_min - NEAR_OPTIMAL_MARGIN <= value
            && value <= band.optimal_max + NEAR_OPTIMAL_MARGIN
        {
            NEAR_OPTIMAL_SCORE
        } else {
            POOR_SCORE
        }
    }

    pub fn parameter_score_named(&self, value: f64, name: &str) -> f64 {
        match Parameter::from_name(name) {
            Some(parameter) => self.parameter_score(value, parameter),
            None => UNKNOWN_PARAMETER_SCORE,
        }
    }
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self::new(SOIL_THRESHOLDS)
    }
}
