//! Static soil threshold tables.
//!
//! Two independent tables are kept here: the per-parameter optimal bands used
//! for condition tiers, health scoring and fertilizer advice, and the stricter
//! danger breach points used only for critical alerts. They are calibrated
//! separately and must not be merged.

use crate::soil::Parameter;
use serde::Serialize;

/// Four ordered breakpoints for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdBand {
    pub critical_low: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub critical_high: f64,
}

impl ThresholdBand {
    pub const fn new(critical_low: f64, optimal_min: f64, optimal_max: f64, critical_high: f64) -> Self {
        Self {
            critical_low,
            optimal_min,
            optimal_max,
            critical_high,
        }
    }

    pub fn is_optimal(&self, value: f64) -> bool {
        self.optimal_min <= value && value <= self.optimal_max
    }

    pub fn midpoint(&self) -> f64 {
        (self.optimal_min + self.optimal_max) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdTable {
    pub nitrogen: ThresholdBand,
    pub phosphorus: ThresholdBand,
    pub potassium: ThresholdBand,
    pub ph: ThresholdBand,
    pub humidity: ThresholdBand,
}

pub const SOIL_THRESHOLDS: ThresholdTable = ThresholdTable {
    nitrogen: ThresholdBand::new(20.0, 80.0, 120.0, 200.0),
    phosphorus: ThresholdBand::new(10.0, 20.0, 40.0, 60.0),
    potassium: ThresholdBand::new(40.0, 100.0, 150.0, 200.0),
    ph: ThresholdBand::new(5.0, 6.0, 7.0, 8.5),
    humidity: ThresholdBand::new(30.0, 50.0, 70.0, 90.0),
};

impl ThresholdTable {
    pub fn band(&self, parameter: Parameter) -> &ThresholdBand {
        match parameter {
            Parameter::Nitrogen => &self.nitrogen,
            Parameter::Phosphorus => &self.phosphorus,
            Parameter::Potassium => &self.potassium,
            Parameter::Ph => &self.ph,
            Parameter::Humidity => &self.humidity,
        }
    }
}

/// Absolute breach points for critical alerting.
///
/// N/P/K only have a lower bound; pH and humidity have a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DangerThresholds {
    pub nitrogen_min: f64,
    pub phosphorus_min: f64,
    pub potassium_min: f64,
    pub ph_low: f64,
    pub ph_high: f64,
    pub humidity_low: f64,
    pub humidity_high: f64,
}

pub const DANGER_THRESHOLDS: DangerThresholds = DangerThresholds {
    nitrogen_min: 15.0,
    phosphorus_min: 8.0,
    potassium_min: 30.0,
    ph_low: 4.5,
    ph_high: 9.0,
    humidity_low: 25.0,
    humidity_high: 95.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_band_is_ordered() {
        for parameter in Parameter::ALL {
            let band = SOIL_THRESHOLDS.band(parameter);
            assert!(band.critical_low <= band.optimal_min, "{parameter:?}");
            assert!(band.optimal_min <= band.optimal_max, "{parameter:?}");
            assert!(band.optimal_max <= band.critical_high, "{parameter:?}");
        }
    }

    #[test]
    fn danger_floor_sits_below_critical_low_for_nutrients() {
        assert!(DANGER_THRESHOLDS.nitrogen_min < SOIL_THRESHOLDS.nitrogen.critical_low);
        assert!(DANGER_THRESHOLDS.phosphorus_min < SOIL_THRESHOLDS.phosphorus.critical_low);
        assert!(DANGER_THRESHOLDS.potassium_min < SOIL_THRESHOLDS.potassium.critical_low);
    }
}
