use crate::provider::SensorProvider;
use crate::recommend::RecommendationEngine;
use crate::soil::SoilMetrics;
use crate::trends::TimeSeriesSample;
use crate::trends::forecast::DEFAULT_HORIZONS_HOURS;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;

/// Shared service state behind `Arc<RwLock<_>>`.
///
/// Latest snapshot and history are also published on `watch` channels. No
/// handler subscribes yet; they are there for push endpoints.
#[derive(Debug)]
pub struct AppState {
    latest: Option<SoilMetrics>,
    latest_tx: watch::Sender<Option<SoilMetrics>>,
    history: Vec<TimeSeriesSample>,
    history_tx: watch::Sender<Vec<TimeSeriesSample>>,
    refreshed_at: Option<OffsetDateTime>,
    engine: Arc<RecommendationEngine>,
    provider: Option<Arc<dyn SensorProvider>>,
    forecast_horizons: Vec<u32>,
}

impl AppState {
    pub fn new() -> Self {
        let (latest_tx, _latest_rx) = watch::channel(None);
        let (history_tx, _history_rx) = watch::channel(Vec::new());
        Self {
            latest: None,
            latest_tx,
            history: Vec::new(),
            history_tx,
            refreshed_at: None,
            engine: Arc::new(RecommendationEngine::expert_only()),
            provider: None,
            forecast_horizons: DEFAULT_HORIZONS_HOURS.to_vec(),
        }
    }

    /// Snapshot from the most recent refresh; `None` before the first one.
    pub fn latest(&self) -> Option<&SoilMetrics> {
        self.latest.as_ref()
    }

    pub fn subscribe_latest(&self) -> watch::Receiver<Option<SoilMetrics>> {
        self.latest_tx.subscribe()
    }

    /// Publishes even when nobody is subscribed.
    pub fn set_latest(&mut self, metrics: SoilMetrics) {
        self.latest = Some(metrics.clone());
        self.refreshed_at = Some(OffsetDateTime::now_utc());
        self.latest_tx.send_replace(Some(metrics));
    }

    pub fn history(&self) -> &[TimeSeriesSample] {
        &self.history
    }

    pub fn subscribe_history(&self) -> watch::Receiver<Vec<TimeSeriesSample>> {
        self.history_tx.subscribe()
    }

    pub fn set_history(&mut self, history: Vec<TimeSeriesSample>) {
        self.history = history.clone();
        self.history_tx.send_replace(history);
    }

    pub fn refreshed_at(&self) -> Option<OffsetDateTime> {
        self.refreshed_at
    }

    pub fn engine(&self) -> Arc<RecommendationEngine> {
        Arc::clone(&self.engine)
    }

    pub fn set_engine(&mut self, engine: RecommendationEngine) {
        self.engine = Arc::new(engine);
    }

    pub fn provider(&self) -> Option<Arc<dyn SensorProvider>> {
        self.provider.clone()
    }

    pub fn set_provider(&mut self, provider: Arc<dyn SensorProvider>) {
        self.provider = Some(provider);
    }

    pub fn forecast_horizons(&self) -> &[u32] {
        &self.forecast_horizons
    }

    pub fn set_forecast_horizons(&mut self, horizons: Vec<u32>) {
        self.forecast_horizons = horizons;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
