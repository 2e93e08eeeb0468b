use crate::soil::SoilMetrics;
use crate::soil::thresholds::{DANGER_THRESHOLDS, DangerThresholds};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<String>,
    pub danger_count: usize,
}

/// Danger-threshold breach detector.
///
/// N, P and K only alarm when depleted; pH and humidity alarm on either side.
#[derive(Debug, Clone, Copy)]
pub struct AlertEvaluator {
    danger: DangerThresholds,
}

impl AlertEvaluator {
    pub fn new(danger: DangerThresholds) -> Self {
        Self { danger }
    }

    pub fn evaluate(&self, metrics: &SoilMetrics) -> AlertReport {
        let danger = &self.danger;
        let checks = [
            (metrics.n < danger.nitrogen_min, "CRITICAL: Nitrogen severely depleted"),
            (metrics.p < danger.phosphorus_min, "CRITICAL: Phosphorus severely depleted"),
            (metrics.k < danger.potassium_min, "CRITICAL: Potassium severely depleted"),
            (
                metrics.ph < danger.ph_low || metrics.ph > danger.ph_high,
                "CRITICAL: pH level dangerous",
            ),
            (
                metrics.humidity < danger.humidity_low || metrics.humidity > danger.humidity_high,
                "CRITICAL: Humidity level dangerous",
            ),
        ];
        let alerts: Vec<String> = checks
            .iter()
            .filter(|(breached, _)| *breached)
            .map(|(_, message)| message.to_string())
            .collect();
        AlertReport {
            danger_count: alerts.len(),
            alerts,
        }
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(DANGER_THRESHOLDS)
    }
}
