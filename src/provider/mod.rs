//! Sensor datastore access and the background refresh pipeline.
//!
//! A [`SensorProvider`] hands back raw JSON records keyed by push id. This
//! module turns them into a [`SoilMetrics`] snapshot and a time series, and
//! keeps [`AppState`] current from a background thread.

use crate::error::AppError;
use crate::soil::SoilMetrics;
use crate::state::AppState;
use crate::trends::TimeSeriesSample;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, warn};

pub mod firebase;
pub mod mock;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const UNKNOWN_TIMESTAMP: &str = "Unknown";

/// One stored reading, as the datastore returns it.
pub type RawRecord = Value;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {status} ({body})")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

pub trait SensorProvider: Send + Sync + fmt::Debug {
    /// Newest record and its key; `Ok(None)` when the store is empty.
    fn latest(&self) -> Result<Option<(String, RawRecord)>, ProviderError>;

    /// Every record by key; `Ok(None)` when the store is empty.
    fn all(&self) -> Result<Option<BTreeMap<String, RawRecord>>, ProviderError>;
}

const NITROGEN_FIELDS: [&str; 2] = ["N", "nitrogen"];
const PHOSPHORUS_FIELDS: [&str; 2] = ["P", "phosphorus"];
const POTASSIUM_FIELDS: [&str; 2] = ["K", "potassium"];
const PH_FIELDS: [&str; 2] = ["ph", "pH"];
const HUMIDITY_FIELDS: [&str; 2] = ["humidity", "moisture"];
const SOIL_MOISTURE_FIELDS: [&str; 1] = ["soil_moisture"];
const TEMPERATURE_FIELDS: [&str; 1] = ["temperature"];
const TIMESTAMP_FIELDS: [&str; 2] = ["timestamp", "date"];

/// First alias holding a finite number or numeric string.
fn field(record: &Value, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .find_map(|alias| record.get(*alias))
        .and_then(number)
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn timestamp_text(record: &Value) -> Option<String> {
    TIMESTAMP_FIELDS
        .iter()
        .find_map(|alias| record.get(*alias))
        .and_then(|value| match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

/// Live snapshot from one record. Missing readings default to zero;
/// `None` when the record is not a JSON object.
pub fn metrics_from_record(record: &RawRecord) -> Option<SoilMetrics> {
    if !record.is_object() {
        return None;
    }
    let reading = |aliases: &[&str]| field(record, aliases).unwrap_or(0.0);
    let mut metrics = SoilMetrics::new(
        reading(&NITROGEN_FIELDS),
        reading(&PHOSPHORUS_FIELDS),
        reading(&POTASSIUM_FIELDS),
        reading(&PH_FIELDS),
        reading(&HUMIDITY_FIELDS),
    )
    .with_timestamp(timestamp_text(record).unwrap_or_else(|| UNKNOWN_TIMESTAMP.to_string()));
    metrics.soil_moisture = field(record, &SOIL_MOISTURE_FIELDS);
    metrics.temperature = field(record, &TEMPERATURE_FIELDS);
    Some(metrics)
}

/// Time series from every record whose timestamp parses. The record key
/// stands in when the record carries no timestamp field.
pub fn samples_from_records(records: &BTreeMap<String, RawRecord>) -> Vec<TimeSeriesSample> {
    let mut skipped = 0usize;
    let mut samples: Vec<TimeSeriesSample> = records
        .iter()
        .filter(|(_, record)| record.is_object())
        .filter_map(|(key, record)| {
            let text = timestamp_text(record).unwrap_or_else(|| key.clone());
            let Some(timestamp) = parse_timestamp(&text) else {
                skipped += 1;
                return None;
            };
            Some(TimeSeriesSample::new(
                timestamp,
                [
                    field(record, &NITROGEN_FIELDS),
                    field(record, &PHOSPHORUS_FIELDS),
                    field(record, &POTASSIUM_FIELDS),
                    field(record, &PH_FIELDS),
                    field(record, &HUMIDITY_FIELDS),
                    field(record, &TEMPERATURE_FIELDS),
                ],
            ))
        })
        .collect();
    if skipped > 0 {
        debug!(skipped, "Skipped records with unparseable timestamps");
    }
    samples.sort_by_key(|sample| sample.timestamp);
    samples
}

/// Accepts RFC 3339 plus naive `T`- or space-separated date-times (with
/// optional fractional seconds) and bare dates. Naive values are UTC.
pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();
    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(parsed);
    }
    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in naive_formats {
        if let Ok(parsed) = PrimitiveDateTime::parse(text, format) {
            return Some(parsed.assume_utc());
        }
    }
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Newest snapshot, or a disconnected default on any failure.
pub fn fetch_latest_metrics(provider: &dyn SensorProvider) -> SoilMetrics {
    match provider.latest() {
        Ok(Some((key, record))) => match metrics_from_record(&record) {
            Some(metrics) => metrics,
            None => {
                warn!(key = %key, "Latest record is not an object");
                SoilMetrics::disconnected()
            }
        },
        Ok(None) => {
            debug!("Datastore has no readings yet");
            SoilMetrics::disconnected()
        }
        Err(err) => {
            warn!(error = %err, "Failed to fetch latest reading");
            SoilMetrics::disconnected()
        }
    }
}

/// Full history; `None` when the fetch failed and previous history should stand.
pub fn fetch_history(provider: &dyn SensorProvider) -> Option<Vec<TimeSeriesSample>> {
    match provider.all() {
        Ok(Some(records)) => Some(samples_from_records(&records)),
        Ok(None) => Some(Vec::new()),
        Err(err) => {
            warn!(error = %err, "Failed to fetch reading history");
            None
        }
    }
}

/// Fetch from the state's provider and publish the results. Without a
/// provider the snapshot is marked disconnected.
pub fn run_refresh_cycle(state: &Arc<RwLock<AppState>>) -> Result<SoilMetrics, AppError> {
    let provider = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.provider()
    };

    let (metrics, history) = match provider.as_deref() {
        Some(provider) => (fetch_latest_metrics(provider), fetch_history(provider)),
        None => (SoilMetrics::disconnected(), None),
    };

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    guard.set_latest(metrics.clone());
    if let Some(history) = history {
        guard.set_history(history);
    }
    Ok(metrics)
}

pub fn spawn_refresh_thread(
    state: Arc<RwLock<AppState>>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        info!(interval_secs = interval.as_secs(), "Refresh thread started");
        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            match run_refresh_cycle(&state) {
                Ok(metrics) => debug!(connected = metrics.connected, "Refresh cycle complete"),
                Err(e) => warn!("Error running refresh cycle: {}", e),
            }

            sleep_with_stop(interval, &stop, cycle_start);
        }
        info!("Refresh thread stopped");
    })
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step.min(remaining - slept));
        slept += step;
    }
}
