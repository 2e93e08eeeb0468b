//! Adapter around an injected, opaque crop classifier.
//!
//! The classifier is handed in at construction; there is no process-wide
//! model. Every failure mode (no classifier, invalid input, classifier error,
//! unknown class index) collapses to `None` so callers can fall back.

use crate::recommend::{Recommendation, RecommendationSource, Recommender};
use crate::soil::SoilMetrics;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Confidence reported when the classifier has no probability interface.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 85.0;

pub const NUTRIENT_INPUT_RANGE: (f64, f64) = (0.0, 1000.0);
pub const PH_INPUT_RANGE: (f64, f64) = (0.0, 14.0);
pub const HUMIDITY_INPUT_RANGE: (f64, f64) = (0.0, 100.0);

/// Dataset crop names mapped onto the local catalog.
const LABEL_SYNONYMS: [(&str, &str); 22] = [
    ("rice", "Rice"),
    ("maize", "Corn"),
    ("chickpea", "Munggo"),
    ("kidneybeans", "Sitaw"),
    ("pigeonpeas", "Peanuts"),
    ("mothbeans", "Sweet Potatoes"),
    ("mungbean", "Munggo"),
    ("blackgram", "Sitaw"),
    ("lentil", "Peanuts"),
    ("pomegranate", "Tomatoes"),
    ("banana", "Banana"),
    ("mango", "Banana"),
    ("grapes", "Tomatoes"),
    ("watermelon", "Cabbage"),
    ("muskmelon", "Cabbage"),
    ("apple", "Tomatoes"),
    ("orange", "Broccoli"),
    ("papaya", "Corn"),
    ("coconut", "Kangkong"),
    ("cotton", "Mustasa"),
    ("jute", "Garlic"),
    ("coffee", "Radish"),
];

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to read classifier artifact: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse classifier artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid classifier: {0}")]
    Invalid(String),
    #[error("remote classifier failed: {0}")]
    Remote(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassPrediction {
    /// Index into the classifier's class list.
    Index(usize),
    Label(String),
}

/// A class and the probabilities produced by the same model evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPrediction {
    pub class: ClassPrediction,
    pub probabilities: Option<Vec<f64>>,
}

/// Opaque crop classifier over `[N, P, K, pH, humidity]`.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn predict(&self, features: &[f64; 5]) -> Result<ClassPrediction, ClassifierError>;

    /// Per-class probabilities, or `Ok(None)` when unsupported.
    fn predict_probabilities(&self, _features: &[f64; 5]) -> Result<Option<Vec<f64>>, ClassifierError> {
        Ok(None)
    }

    /// Class labels addressed by [`ClassPrediction::Index`].
    fn classes(&self) -> Option<&[String]> {
        None
    }

    /// Class and probabilities in one evaluation. A probability failure
    /// leaves the class intact with no probabilities.
    fn predict_with_probabilities(&self, features: &[f64; 5]) -> Result<ScoredPrediction, ClassifierError> {
        let class = self.predict(features)?;
        let probabilities = match self.predict_probabilities(features) {
            Ok(probabilities) => probabilities,
            Err(err) => {
                debug!(error = %err, "Probability interface failed");
                None
            }
        };
        Ok(ScoredPrediction { class, probabilities })
    }
}

#[derive(Debug, Clone)]
pub struct ModelRecommender {
    classifier: Option<Arc<dyn Classifier>>,
    default_confidence: f64,
}

impl ModelRecommender {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
            default_confidence: DEFAULT_MODEL_CONFIDENCE,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            classifier: None,
            default_confidence: DEFAULT_MODEL_CONFIDENCE,
        }
    }

    pub fn with_default_confidence(mut self, confidence: f64) -> Self {
        self.default_confidence = confidence;
        self
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    /// Crop name and confidence percent, or `None` on any failure.
    pub fn predict(&self, metrics: &SoilMetrics) -> Option<(String, f64)> {
        let classifier = self.classifier.as_ref()?;
        if !input_is_valid(metrics) {
            debug!(
                n = metrics.n,
                p = metrics.p,
                k = metrics.k,
                ph = metrics.ph,
                humidity = metrics.humidity,
                "Model input outside accepted ranges"
            );
            return None;
        }

        let features = metrics.features();
        let scored = match classifier.predict_with_probabilities(&features) {
            Ok(scored) => scored,
            Err(err) => {
                warn!(error = %err, "Classifier prediction failed");
                return None;
            }
        };
        let label = match scored.class {
            ClassPrediction::Label(label) => label,
            ClassPrediction::Index(index) => {
                match classifier.classes().and_then(|classes| classes.get(index)) {
                    Some(label) => label.clone(),
                    None => {
                        warn!(index, "Classifier returned an unknown class index");
                        return None;
                    }
                }
            }
        };

        let confidence = scored
            .probabilities
            .as_deref()
            .and_then(max_probability)
            .map(|max| max * 100.0)
            .unwrap_or(self.default_confidence);

        Some((local_crop_name(&label), confidence))
    }
}

impl Default for ModelRecommender {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl Recommender for ModelRecommender {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::Model
    }

    fn recommend(&self, metrics: &SoilMetrics) -> Option<Recommendation> {
        let (crop, confidence) = self.predict(metrics)?;
        Some(Recommendation {
            crop,
            confidence,
            source: RecommendationSource::Model,
        })
    }
}

fn within(value: f64, (min, max): (f64, f64)) -> bool {
    min <= value && value <= max
}

fn input_is_valid(metrics: &SoilMetrics) -> bool {
    [metrics.n, metrics.p, metrics.k]
        .iter()
        .all(|value| within(*value, NUTRIENT_INPUT_RANGE))
        && within(metrics.ph, PH_INPUT_RANGE)
        && within(metrics.humidity, HUMIDITY_INPUT_RANGE)
}

fn max_probability(probabilities: &[f64]) -> Option<f64> {
    probabilities
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(None, |max: Option<f64>, p| Some(max.map_or(p, |m| m.max(p))))
}

/// Map a dataset label to the local crop name, title-casing unknown labels.
pub fn local_crop_name(label: &str) -> String {
    let lowered = label.to_lowercase();
    LABEL_SYNONYMS
        .iter()
        .find(|(dataset, _)| *dataset == lowered)
        .map(|(_, local)| local.to_string())
        .unwrap_or_else(|| title_case(label))
}

fn title_case(label: &str) -> String {
    let mut result = String::with_capacity(label.len());
    let mut at_word_start = true;
    for ch in label.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(ch);
            at_word_start = true;
        }
    }
    result
}
