use crate::soil::Parameter;
use crate::soil::thresholds::{SOIL_THRESHOLDS, ThresholdTable};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    CriticalLow,
    CriticalHigh,
    Optimal,
    Warning,
    Unknown,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::CriticalLow => "Critical: Too Low",
            Tier::CriticalHigh => "Critical: Too High",
            Tier::Optimal => "Optimal",
            Tier::Warning => "Suboptimal",
            Tier::Unknown => "Unknown",
        }
    }

    /// Coarse severity used for badge colouring.
    pub fn severity(self) -> &'static str {
        match self {
            Tier::CriticalLow | Tier::CriticalHigh => "critical",
            Tier::Optimal => "optimal",
            Tier::Warning => "warning",
            Tier::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConditionClassifier {
    table: ThresholdTable,
}

impl ConditionClassifier {
    pub fn new(table: ThresholdTable) -> Self {
        Self { table }
    }

    pub fn classify(&self, value: f64, parameter: Parameter) -> Tier {
        if !value.is_finite() {
            return Tier::Unknown;
        }
        let band = self.table.band(parameter);
        if value < band.critical_low {
            Tier::CriticalLow
        } else if value > band.critical_high {
            Tier::CriticalHigh
        } else if band.is_optimal(value) {
            Tier::Optimal
        } else {
            Tier::Warning
        }
    }

    /// Classify by parameter name; unrecognised names yield `Tier::Unknown`.
    pub fn classify_named(&self, value: f64, name: &str) -> Tier {
        match Parameter::from_name(name) {
            Some(parameter) => self.classify(value, parameter),
            None => Tier::Unknown,
        }
    }
}

impl Default for ConditionClassifier {
    fn default() -> Self {
        Self::new(SOIL_THRESHOLDS)
    }
}
