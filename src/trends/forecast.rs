//! Least-squares slope forecaster over the most recent readings.
//!
//! The fitted line is indexed by sample, and a horizon of `h` hours is
//! projected `h / 24` samples past the newest one, i.e. one sample per day.

use crate::trends::{TimeSeriesSample, Trend, present_values};
use serde::Serialize;

pub const HISTORY_WINDOW: usize = 10;
pub const MIN_SAMPLES: usize = 3;
pub const DEFAULT_HORIZONS_HOURS: [u32; 2] = [24, 72];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForecastSensor {
    #[serde(rename = "N")]
    Nitrogen,
    #[serde(rename = "P")]
    Phosphorus,
    #[serde(rename = "K")]
    Potassium,
    #[serde(rename = "Soil_pH")]
    SoilPh,
    Humidity,
    Temperature,
}

impl ForecastSensor {
    pub const ALL: [ForecastSensor; 6] = [
        ForecastSensor::Nitrogen,
        ForecastSensor::Phosphorus,
        ForecastSensor::Potassium,
        ForecastSensor::SoilPh,
        ForecastSensor::Humidity,
        ForecastSensor::Temperature,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ForecastSensor::Nitrogen => "N",
            ForecastSensor::Phosphorus => "P",
            ForecastSensor::Potassium => "K",
            ForecastSensor::SoilPh => "Soil_pH",
            ForecastSensor::Humidity => "Humidity",
            ForecastSensor::Temperature => "Temperature",
        }
    }

    /// Projected values outside this band raise an alert.
    pub fn critical_band(self) -> (f64, f64) {
        match self {
            ForecastSensor::Nitrogen => (40.0, 140.0),
            ForecastSensor::Phosphorus => (20.0, 80.0),
            ForecastSensor::Potassium => (40.0, 200.0),
            ForecastSensor::SoilPh => (5.5, 7.5),
            ForecastSensor::Humidity => (40.0, 80.0),
            ForecastSensor::Temperature => (20.0, 35.0),
        }
    }

    pub fn value(self, sample: &TimeSeriesSample) -> Option<f64> {
        match self {
            ForecastSensor::Nitrogen => sample.n,
            ForecastSensor::Phosphorus => sample.p,
            ForecastSensor::Potassium => sample.k,
            ForecastSensor::SoilPh => sample.ph,
            ForecastSensor::Humidity => sample.humidity,
            ForecastSensor::Temperature => sample.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub hours_ahead: u32,
    pub current: f64,
    pub predicted: f64,
    pub change: f64,
    pub trend: Trend,
    pub alert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorForecast {
    pub sensor: ForecastSensor,
    pub forecasts: Vec<Forecast>,
}

#[derive(Debug, Clone, Copy)]
pub struct SlopeForecaster {
    window: usize,
}

impl SlopeForecaster {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(MIN_SAMPLES),
        }
    }

    /// `None` with fewer than three values. Values are oldest first.
    pub fn forecast(&self, values: &[f64], sensor: ForecastSensor, hours_ahead: u32) -> Option<Forecast> {
        if values.len() < MIN_SAMPLES {
            return None;
        }
        let recent = &values[values.len().saturating_sub(self.window)..];
        let (slope, intercept) = fit_line(recent)?;
        let current = *recent.last()?;
        let horizon = recent.len() as f64 + f64::from(hours_ahead) / 24.0;
        let predicted = slope * horizon + intercept;
        let change = predicted - current;
        let trend = if change > 0.0 {
            Trend::Increasing
        } else if change < 0.0 {
            Trend::Decreasing
        } else {
            Trend::Stable
        };
        Some(Forecast {
            hours_ahead,
            current,
            predicted,
            change,
            trend,
            alert: critical_alert(sensor, predicted, hours_ahead),
        })
    }
}

impl Default for SlopeForecaster {
    fn default() -> Self {
        Self::new(HISTORY_WINDOW)
    }
}

/// Forecast every sensor with at least three present readings.
pub fn forecast_all(samples: &[TimeSeriesSample], horizons_hours: &[u32]) -> Vec<SensorForecast> {
    let forecaster = SlopeForecaster::default();
    ForecastSensor::ALL
        .iter()
        .filter_map(|sensor| {
            let values = present_values(samples, |sample| sensor.value(sample));
            let forecasts: Vec<Forecast> = horizons_hours
                .iter()
                .filter_map(|hours| forecaster.forecast(&values, *sensor, *hours))
                .collect();
            if forecasts.is_empty() {
                None
            } else {
                Some(SensorForecast {
                    sensor: *sensor,
                    forecasts,
                })
            }
        })
        .collect()
}

/// Ordinary least squares over `(index, value)`.
fn fit_line(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (index, value) in values.iter().enumerate() {
        let dx = index as f64 - mean_x;
        sxy += dx * (value - mean_y);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

fn critical_alert(sensor: ForecastSensor, predicted: f64, hours_ahead: u32) -> Option<String> {
    let (low, high) = sensor.critical_band();
    let direction = if predicted < low {
        "LOW"
    } else if predicted > high {
        "HIGH"
    } else {
        return None;
    };
    let days = (f64::from(hours_ahead) / 24.0).round();
    Some(format!(
        "{} will reach critical {direction} in {days:.0} days",
        sensor.name()
    ))
}
