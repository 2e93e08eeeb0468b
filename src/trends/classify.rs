use crate::soil::Parameter;
use crate::trends::{TimeSeriesSample, present_values};
use serde::Serialize;

pub const WINDOW: usize = 3;
pub const MIN_SAMPLES: usize = 2;
pub const RISE_FACTOR: f64 = 1.1;
pub const FALL_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NutrientTrends {
    #[serde(rename = "N")]
    pub nitrogen: Trend,
    #[serde(rename = "P")]
    pub phosphorus: Trend,
    #[serde(rename = "K")]
    pub potassium: Trend,
}

impl NutrientTrends {
    pub const STABLE: NutrientTrends = NutrientTrends {
        nitrogen: Trend::Stable,
        phosphorus: Trend::Stable,
        potassium: Trend::Stable,
    };

    pub fn get(&self, parameter: Parameter) -> Option<Trend> {
        match parameter {
            Parameter::Nitrogen => Some(self.nitrogen),
            Parameter::Phosphorus => Some(self.phosphorus),
            Parameter::Potassium => Some(self.potassium),
            Parameter::Ph | Parameter::Humidity => None,
        }
    }
}

/// Compares the mean of the newest readings against the oldest ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// N, P and K trends; all stable below two samples.
    pub fn classify(&self, samples: &[TimeSeriesSample]) -> NutrientTrends {
        if samples.len() < MIN_SAMPLES {
            return NutrientTrends::STABLE;
        }
        let trend = |parameter: Parameter| {
            classify_values(&present_values(samples, |sample| sample.value(parameter)))
        };
        NutrientTrends {
            nitrogen: trend(Parameter::Nitrogen),
            phosphorus: trend(Parameter::Phosphorus),
            potassium: trend(Parameter::Potassium),
        }
    }
}

/// Windows overlap when fewer than six values exist.
pub fn classify_values(values: &[f64]) -> Trend {
    if values.is_empty() {
        return Trend::Stable;
    }
    let window = WINDOW.min(values.len());
    let older = mean(&values[..window]);
    let recent = mean(&values[values.len() - window..]);
    if recent > older * RISE_FACTOR {
        Trend::Increasing
    } else if recent < older * FALL_FACTOR {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
