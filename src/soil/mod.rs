use serde::{Deserialize, Serialize};

pub mod condition;
pub mod health;
pub mod thresholds;

pub const NO_DATA_TIMESTAMP: &str = "No data";

/// Soil parameters scored by the threshold, health and recommendation engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "N")]
    Nitrogen,
    #[serde(rename = "P")]
    Phosphorus,
    #[serde(rename = "K")]
    Potassium,
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "humidity")]
    Humidity,
}

impl Parameter {
    /// Fixed evaluation order used by every aggregate (N, P, K, pH, humidity).
    pub const ALL: [Parameter; 5] = [
        Parameter::Nitrogen,
        Parameter::Phosphorus,
        Parameter::Potassium,
        Parameter::Ph,
        Parameter::Humidity,
    ];

    pub const NUTRIENTS: [Parameter; 3] = [
        Parameter::Nitrogen,
        Parameter::Phosphorus,
        Parameter::Potassium,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Nitrogen => "N",
            Parameter::Phosphorus => "P",
            Parameter::Potassium => "K",
            Parameter::Ph => "pH",
            Parameter::Humidity => "humidity",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Parameter::Nitrogen => "Nitrogen",
            Parameter::Phosphorus => "Phosphorus",
            Parameter::Potassium => "Potassium",
            Parameter::Ph => "pH",
            Parameter::Humidity => "Humidity",
        }
    }

    /// Resolve a parameter from the names used by sensor payloads and forms.
    pub fn from_name(name: &str) -> Option<Parameter> {
        match name {
            "N" | "n" | "nitrogen" => Some(Parameter::Nitrogen),
            "P" | "p" | "phosphorus" => Some(Parameter::Phosphorus),
            "K" | "k" | "potassium" => Some(Parameter::Potassium),
            "pH" | "ph" | "Soil_pH" => Some(Parameter::Ph),
            "humidity" | "Humidity" | "moisture" => Some(Parameter::Humidity),
            _ => None,
        }
    }

    /// Declared measurement range. Values outside it are flagged, not rejected.
    pub fn declared_range(self) -> (f64, Option<f64>) {
        match self {
            Parameter::Nitrogen | Parameter::Phosphorus | Parameter::Potassium => (0.0, None),
            Parameter::Ph => (0.0, Some(14.0)),
            Parameter::Humidity => (0.0, Some(100.0)),
        }
    }
}

/// One normalized sensor snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilMetrics {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub ph: f64,
    pub humidity: f64,
    #[serde(default)]
    pub soil_moisture: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    pub timestamp: String,
    /// Whether the values came from a live reading rather than defaults.
    pub connected: bool,
}

impl SoilMetrics {
    pub fn new(n: f64, p: f64, k: f64, ph: f64, humidity: f64) -> Self {
        Self {
            n,
            p,
            k,
            ph,
            humidity,
            soil_moisture: None,
            temperature: None,
            timestamp: String::new(),
            connected: true,
        }
    }

    /// Snapshot used when the datastore has nothing usable.
    pub fn disconnected() -> Self {
        Self {
            n: 0.0,
            p: 0.0,
            k: 0.0,
            ph: 0.0,
            humidity: 0.0,
            soil_moisture: Some(0.0),
            temperature: Some(0.0),
            timestamp: NO_DATA_TIMESTAMP.to_string(),
            connected: false,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Nitrogen => self.n,
            Parameter::Phosphorus => self.p,
            Parameter::Potassium => self.k,
            Parameter::Ph => self.ph,
            Parameter::Humidity => self.humidity,
        }
    }

    /// Feature vector in model order: N, P, K, pH, humidity.
    pub fn features(&self) -> [f64; 5] {
        [self.n, self.p, self.k, self.ph, self.humidity]
    }

    pub fn is_finite(&self) -> bool {
        Parameter::ALL
            .iter()
            .all(|parameter| self.value(*parameter).is_finite())
    }

    /// Parameters whose value falls outside the declared measurement range.
    pub fn out_of_range(&self) -> Vec<Parameter> {
        Parameter::ALL
            .iter()
            .copied()
            .filter(|parameter| {
                let value = self.value(*parameter);
                let (min, max) = parameter.declared_range();
                !value.is_finite() || value < min || max.is_some_and(|max| value > max)
            })
            .collect()
    }
}

impl Default for SoilMetrics {
    fn default() -> Self {
        Self::disconnected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_accessor_matches_fields() {
        let metrics = SoilMetrics::new(1.0, 2.0, 3.0, 4.0, 5.0);

        let values: Vec<f64> = Parameter::ALL.iter().map(|p| metrics.value(*p)).collect();

        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(metrics.features(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn out_of_range_values_are_flagged_not_rejected() {
        let metrics = SoilMetrics::new(-5.0, 20.0, 100.0, 15.0, 120.0);

        assert_eq!(
            metrics.out_of_range(),
            vec![Parameter::Nitrogen, Parameter::Ph, Parameter::Humidity]
        );
        assert!(metrics.is_finite());
    }

    #[test]
    fn disconnected_snapshot_has_no_data_timestamp() {
        let metrics = SoilMetrics::disconnected();

        assert!(!metrics.connected);
        assert_eq!(metrics.timestamp, NO_DATA_TIMESTAMP);
        assert_eq!(metrics.features(), [0.0; 5]);
    }

    #[test]
    fn parameter_names_resolve_aliases() {
        assert_eq!(Parameter::from_name("ph"), Some(Parameter::Ph));
        assert_eq!(Parameter::from_name("moisture"), Some(Parameter::Humidity));
        assert_eq!(Parameter::from_name("nitrogen"), Some(Parameter::Nitrogen));
        assert_eq!(Parameter::from_name("calcium"), None);
    }

    #[test]
    fn parameter_serializes_with_short_names() -> Result<(), Box<dyn std::error::Error>> {
        let value = serde_json::to_value(Parameter::ALL)?;

        assert_eq!(value, serde_json::json!(["N", "P", "K", "pH", "humidity"]));
        Ok(())
    }
}
