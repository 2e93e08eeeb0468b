use crate::provider::{ProviderError, RawRecord, SensorProvider};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory provider for tests and offline runs.
#[derive(Debug, Default)]
pub struct MockProvider {
    records: BTreeMap<String, RawRecord>,
    failure: Option<String>,
    fetches: AtomicUsize,
}

impl MockProvider {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_records(records: BTreeMap<String, RawRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Every call fails with a transport error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Number of `latest` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), ProviderError> {
        match &self.failure {
            Some(message) => Err(ProviderError::Transport(message.clone())),
            None => Ok(()),
        }
    }
}

impl SensorProvider for MockProvider {
    fn latest(&self) -> Result<Option<(String, RawRecord)>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.check()?;
        Ok(self
            .records
            .iter()
            .next_back()
            .map(|(key, record)| (key.clone(), record.clone())))
    }

    fn all(&self) -> Result<Option<BTreeMap<String, RawRecord>>, ProviderError> {
        self.check()?;
        if self.records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.records.clone()))
        }
    }
}
