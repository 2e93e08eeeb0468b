use crate::soil::Parameter;
use crate::trends::{TimeSeriesSample, present_values};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub parameter: Parameter,
    /// Number of present readings.
    pub count: usize,
    /// Mean over every sample, missing readings counted as zero.
    pub mean: Option<f64>,
    /// Box statistics over present readings only.
    pub quartiles: Option<Quartiles>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub parameters: Vec<Parameter>,
    /// Row-major Pearson coefficients; `None` where a series has no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub sample_count: usize,
    pub parameters: Vec<ParameterSummary>,
    pub correlation: CorrelationMatrix,
}

pub fn summarize(samples: &[TimeSeriesSample]) -> SummaryStatistics {
    let zero_filled: Vec<Vec<f64>> = Parameter::ALL
        .iter()
        .map(|parameter| {
            samples
                .iter()
                .map(|sample| sample.value(*parameter).unwrap_or(0.0))
                .collect()
        })
        .collect();

    let parameters = Parameter::ALL
        .iter()
        .zip(&zero_filled)
        .map(|(parameter, filled)| {
            let present = present_values(samples, |sample| sample.value(*parameter));
            ParameterSummary {
                parameter: *parameter,
                count: present.len(),
                mean: mean(filled),
                quartiles: quartiles(&present),
            }
        })
        .collect();

    let values = zero_filled
        .iter()
        .map(|row| zero_filled.iter().map(|column| pearson(row, column)).collect())
        .collect();

    SummaryStatistics {
        sample_count: samples.len(),
        parameters,
        correlation: CorrelationMatrix {
            parameters: Parameter::ALL.to_vec(),
            values,
        },
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Five-number summary using linear interpolation between order statistics.
pub fn quartiles(values: &[f64]) -> Option<Quartiles> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(Quartiles {
        min: sorted[0],
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        q3: percentile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let (mut covariance, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(covariance / (var_x * var_y).sqrt())
}
