//! Historical series analysis: trend classification, summary statistics and
//! a slope forecaster.
//!
//! Missing readings are `None`. Trend, quartile and forecast computations
//! skip them; means and correlations count them as zero.

use crate::soil::Parameter;
use serde::Serialize;
use time::OffsetDateTime;

pub mod classify;
pub mod forecast;
pub mod stats;

pub use classify::{NutrientTrends, Trend, TrendAnalyzer};
pub use forecast::{Forecast, ForecastSensor, SensorForecast, SlopeForecaster, forecast_all};
pub use stats::{Quartiles, SummaryStatistics, summarize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesSample {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub n: Option<f64>,
    pub p: Option<f64>,
    pub k: Option<f64>,
    pub ph: Option<f64>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
}

impl TimeSeriesSample {
    /// Build a sample, storing absent, non-finite and zero readings as missing.
    pub fn new(timestamp: OffsetDateTime, values: [Option<f64>; 6]) -> Self {
        let [n, p, k, ph, humidity, temperature] = values.map(present);
        Self {
            timestamp,
            n,
            p,
            k,
            ph,
            humidity,
            temperature,
        }
    }

    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Nitrogen => self.n,
            Parameter::Phosphorus => self.p,
            Parameter::Potassium => self.k,
            Parameter::Ph => self.ph,
            Parameter::Humidity => self.humidity,
        }
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Samples ordered by timestamp, oldest first. Equal timestamps keep input order.
pub fn sorted_by_time(samples: &[TimeSeriesSample]) -> Vec<&TimeSeriesSample> {
    let mut ordered: Vec<&TimeSeriesSample> = samples.iter().collect();
    ordered.sort_by_key(|sample| sample.timestamp);
    ordered
}

/// Present values of one series, oldest first.
pub fn present_values(
    samples: &[TimeSeriesSample],
    value: impl Fn(&TimeSeriesSample) -> Option<f64>,
) -> Vec<f64> {
    sorted_by_time(samples)
        .into_iter()
        .filter_map(|sample| value(sample))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn zero_and_non_finite_readings_are_missing() {
        let sample = TimeSeriesSample::new(
            OffsetDateTime::UNIX_EPOCH,
            [Some(0.0), Some(f64::NAN), None, Some(6.5), Some(f64::INFINITY), Some(28.0)],
        );

        assert_eq!(sample.n, None);
        assert_eq!(sample.p, None);
        assert_eq!(sample.k, None);
        assert_eq!(sample.ph, Some(6.5));
        assert_eq!(sample.humidity, None);
        assert_eq!(sample.temperature, Some(28.0));
    }

    #[test]
    fn present_values_follow_time_order() {
        let later = TimeSeriesSample::new(
            OffsetDateTime::UNIX_EPOCH + Duration::hours(2),
            [Some(30.0), None, None, None, None, None],
        );
        let gap = TimeSeriesSample::new(
            OffsetDateTime::UNIX_EPOCH + Duration::hours(1),
            [None, None, None, None, None, None],
        );
        let earlier = TimeSeriesSample::new(
            OffsetDateTime::UNIX_EPOCH,
            [Some(10.0), None, None, None, None, None],
        );

        let values = present_values(&[later, gap, earlier], |s| s.value(Parameter::Nitrogen));

        assert_eq!(values, vec![10.0, 30.0]);
    }
}
