//! Client for a Firebase-style realtime JSON store over HTTPS.

use crate::provider::{ProviderError, RawRecord, SensorProvider};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_NODE: &str = "/sensor_logs.json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_HISTORY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FirebaseProvider {
    base_url: String,
    node: String,
    latest_agent: ureq::Agent,
    history_agent: ureq::Agent,
}

impl FirebaseProvider {
    pub fn new(
        base_url: &str,
        node: &str,
        timeout: Duration,
        history_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ProviderError::Transport(
                "datastore url must start with http:// or https://".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            node: normalize_node(node),
            latest_agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            history_agent: ureq::AgentBuilder::new().timeout(history_timeout).build(),
        })
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.node)
    }

    fn fetch(&self, request: ureq::Request) -> Result<Value, ProviderError> {
        let response = request
            .set("Accept", "application/json")
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, response) => ProviderError::Status {
                    status,
                    body: response.into_string().unwrap_or_default().trim().to_string(),
                },
                ureq::Error::Transport(transport) => ProviderError::Transport(transport.to_string()),
            })?;
        response
            .into_json::<Value>()
            .map_err(|err| ProviderError::Decode(err.to_string()))
    }
}

impl fmt::Debug for FirebaseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseProvider")
            .field("url", &self.url())
            .finish()
    }
}

impl SensorProvider for FirebaseProvider {
    fn latest(&self) -> Result<Option<(String, RawRecord)>, ProviderError> {
        let request = self
            .latest_agent
            .get(&self.url())
            .query("orderBy", "\"$key\"")
            .query("limitToLast", "1");
        let records = records_from_body(self.fetch(request)?)?;
        Ok(records.and_then(|records| records.into_iter().next_back()))
    }

    fn all(&self) -> Result<Option<BTreeMap<String, RawRecord>>, ProviderError> {
        let request = self.history_agent.get(&self.url());
        records_from_body(self.fetch(request)?)
    }
}

fn normalize_node(node: &str) -> String {
    let trimmed = node.trim();
    if trimmed.is_empty() {
        return DEFAULT_NODE.to_string();
    }
    let mut node = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    if !node.ends_with(".json") {
        node.push_str(".json");
    }
    node
}

/// The store answers `null` when empty, an object keyed by push id, or an
/// array when keys are small integers (with `null` holes).
fn records_from_body(body: Value) -> Result<Option<BTreeMap<String, RawRecord>>, ProviderError> {
    match body {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map.into_iter().collect())),
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .enumerate()
                .filter(|(_, item)| !item.is_null())
                .map(|(index, item)| (format!("{index:010}"), item))
                .collect(),
        )),
        other => Err(ProviderError::Decode(format!(
            "expected object, array or null, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_joins_base_and_node() -> Result<(), ProviderError> {
        let provider = FirebaseProvider::new(
            "https://farm-default-rtdb.firebaseio.com/",
            "sensor_logs",
            DEFAULT_TIMEOUT,
            DEFAULT_HISTORY_TIMEOUT,
        )?;

        assert_eq!(
            provider.url(),
            "https://farm-default-rtdb.firebaseio.com/sensor_logs.json"
        );
        Ok(())
    }

    #[test]
    fn rejects_non_http_url() {
        let result = FirebaseProvider::new("farm.example", DEFAULT_NODE, DEFAULT_TIMEOUT, DEFAULT_TIMEOUT);

        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }

    #[test]
    fn null_body_means_no_records() -> Result<(), ProviderError> {
        assert_eq!(records_from_body(Value::Null)?, None);
        Ok(())
    }

    #[test]
    fn object_body_is_keyed_by_push_id() -> Result<(), ProviderError> {
        let records = records_from_body(json!({
            "-Nb2": {"N": 90},
            "-Na1": {"N": 80}
        }))?
        .unwrap_or_default();

        let keys: Vec<_> = records.keys().cloned().collect();
        assert_eq!(keys, vec!["-Na1", "-Nb2"]);
        Ok(())
    }

    #[test]
    fn array_body_skips_holes_and_keeps_order() -> Result<(), ProviderError> {
        let records = records_from_body(json!([null, {"N": 1}, null, {"N": 3}]))?.unwrap_or_default();

        let values: Vec<_> = records.values().map(|record| record["N"].clone()).collect();
        assert_eq!(values, vec![json!(1), json!(3)]);
        Ok(())
    }

    #[test]
    fn scalar_body_is_a_decode_error() {
        assert!(matches!(
            records_from_body(json!("oops")),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn unreachable_store_is_a_transport_error() -> Result<(), ProviderError> {
        let provider = FirebaseProvider::new(
            "http://127.0.0.1:9",
            DEFAULT_NODE,
            Duration::from_millis(200),
            Duration::from_millis(200),
        )?;

        assert!(matches!(provider.latest(), Err(ProviderError::Transport(_))));
        Ok(())
    }
}
