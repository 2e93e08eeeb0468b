use crate::soil::Parameter;
use crate::soil::thresholds::{SOIL_THRESHOLDS, ThresholdTable};

pub const OPTIMAL_MESSAGE: &str = "Nutrient levels are optimal";

struct Dosage {
    parameter: Parameter,
    apply: &'static str,
    reduce: &'static str,
}

const DOSAGES: [Dosage; 3] = [
    Dosage {
        parameter: Parameter::Nitrogen,
        apply: "Apply Nitrogen fertilizer (Urea 46-0-0): 50-100 kg/ha",
        reduce: "Reduce Nitrogen application",
    },
    Dosage {
        parameter: Parameter::Phosphorus,
        apply: "Apply Phosphorus fertilizer (DAP 18-46-0): 30-60 kg/ha",
        reduce: "Reduce Phosphorus application",
    },
    Dosage {
        parameter: Parameter::Potassium,
        apply: "Apply Potassium fertilizer (MOP 0-0-60): 40-80 kg/ha",
        reduce: "Reduce Potassium application",
    },
];

/// Per-nutrient dosing advice against the optimal band.
#[derive(Debug, Clone, Copy)]
pub struct FertilizerAdvisor {
    table: ThresholdTable,
}

impl FertilizerAdvisor {
    pub fn new(table: ThresholdTable) -> Self {
        Self { table }
    }

    /// Messages in N, P, K order; a single optimal message when none apply.
    pub fn advise(&self, n: f64, p: f64, k: f64) -> Vec<String> {
        let mut advice: Vec<String> = DOSAGES
            .iter()
            .zip([n, p, k])
            .filter_map(|(dosage, value)| {
                let band = self.table.band(dosage.parameter);
                if value < band.optimal_min {
                    Some(dosage.apply.to_string())
                } else if value > band.optimal_max {
                    Some(dosage.reduce.to_string())
                } else {
                    None
                }
            })
            .collect();
        if advice.is_empty() {
            advice.push(OPTIMAL_MESSAGE.to_string());
        }
        advice
    }
}

impl Default for FertilizerAdvisor {
    fn default() -> Self {
        Self::new(SOIL_THRESHOLDS)
    }
}
