use crate::recommend::model::{ClassPrediction, Classifier, ClassifierError, ScoredPrediction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

const API_VERSION: &str = "1.0";
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteParams {
    pub endpoint: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_model_id() -> String {
    "crop".to_string()
}

/// Classifier served by an HTTP prediction endpoint.
///
/// Label and probabilities come from the same response. When the call fails
/// both come from the fallback.
pub struct RemoteClassifier {
    endpoint: String,
    model_id: String,
    agent: ureq::Agent,
    timeout: Duration,
    classes: Vec<String>,
    fallback: Option<Box<dyn Classifier>>,
}

impl RemoteClassifier {
    pub fn new(
        params: RemoteParams,
        classes: Vec<String>,
        fallback: Option<Box<dyn Classifier>>,
    ) -> Result<Self, ClassifierError> {
        if !params.endpoint.starts_with("http://") && !params.endpoint.starts_with("https://") {
            return Err(ClassifierError::Invalid(
                "endpoint must start with http:// or https://".to_string(),
            ));
        }
        let timeout = Duration::from_millis(params.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            endpoint: params.endpoint,
            model_id: params.model_id,
            agent,
            timeout,
            classes,
            fallback,
        })
    }

    fn call_remote(&self, features: &[f64; 5]) -> Result<PredictResponse, ClassifierError> {
        let request = PredictRequest::new(&self.model_id, features)?;
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Accept", "application/json")
            .send_json(&request)
            .map_err(|err| match err {
                ureq::Error::Status(code, response) => ClassifierError::Remote(format!(
                    "http status {code} ({})",
                    response.into_string().unwrap_or_default().trim()
                )),
                ureq::Error::Transport(transport) => ClassifierError::Remote(transport.to_string()),
            })?;
        let body = response
            .into_string()
            .map_err(|err| ClassifierError::Remote(err.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn fallback_or<T>(
        &self,
        err: ClassifierError,
        call: impl FnOnce(&dyn Classifier) -> Result<T, ClassifierError>,
    ) -> Result<T, ClassifierError> {
        warn!(error = %err, endpoint = %self.endpoint, "Remote classifier call failed");
        match self.fallback.as_deref() {
            Some(fallback) => {
                warn!("Falling back to local classifier");
                call(fallback)
            }
            None => Err(err),
        }
    }
}

impl fmt::Debug for RemoteClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteClassifier")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("model_id", &self.model_id)
            .field("classes", &self.classes.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Classifier for RemoteClassifier {
    fn predict(&self, features: &[f64; 5]) -> Result<ClassPrediction, ClassifierError> {
        self.predict_with_probabilities(features)
            .map(|scored| scored.class)
    }

    fn predict_probabilities(&self, features: &[f64; 5]) -> Result<Option<Vec<f64>>, ClassifierError> {
        self.predict_with_probabilities(features)
            .map(|scored| scored.probabilities)
    }

    fn classes(&self) -> Option<&[String]> {
        if self.classes.is_empty() {
            self.fallback.as_deref().and_then(|fallback| fallback.classes())
        } else {
            Some(&self.classes)
        }
    }

    fn predict_with_probabilities(&self, features: &[f64; 5]) -> Result<ScoredPrediction, ClassifierError> {
        match self.call_remote(features).and_then(PredictResponse::into_scored) {
            Ok(scored) => Ok(scored),
            Err(err) => self.fallback_or(err, |fallback| fallback.predict_with_probabilities(features)),
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    api_version: &'static str,
    model_id: &'a str,
    features: [f64; 5],
    timestamp: String,
}

impl<'a> PredictRequest<'a> {
    fn new(model_id: &'a str, features: &[f64; 5]) -> Result<Self, ClassifierError> {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| ClassifierError::Remote(format!("timestamp error: {err}")))?;
        Ok(Self {
            api_version: API_VERSION,
            model_id,
            features: *features,
            timestamp,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    class_index: Option<usize>,
    #[serde(default)]
    probabilities: Option<Vec<f64>>,
}

impl PredictResponse {
    fn into_scored(self) -> Result<ScoredPrediction, ClassifierError> {
        let class = match (self.label, self.class_index) {
            (Some(label), _) => ClassPrediction::Label(label),
            (None, Some(index)) => ClassPrediction::Index(index),
            (None, None) => {
                return Err(ClassifierError::Remote(
                    "response has neither label nor class_index".to_string(),
                ));
            }
        };
        Ok(ScoredPrediction {
            class,
            probabilities: self.probabilities,
        })
    }
}
