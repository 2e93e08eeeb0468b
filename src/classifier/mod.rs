//! Concrete classifier artifacts behind the [`Classifier`] seam.
//!
//! An artifact is a JSON file naming the model kind, the label-encoder class
//! list and kind-specific parameters. Remote artifacts may nest a local
//! fallback artifact.

use crate::recommend::model::{Classifier, ClassifierError};
use serde::Deserialize;
use std::path::Path;

pub mod forest;
pub mod remote;

use forest::{DecisionForest, ForestParams};
use remote::{RemoteClassifier, RemoteParams};

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierFile {
    pub model: String,
    #[serde(default)]
    pub classes: Vec<String>,
    pub params: serde_json::Value,
    #[serde(default)]
    pub fallback: Option<Box<ClassifierFile>>,
}

pub fn create_classifier(file: &ClassifierFile) -> Result<Box<dyn Classifier>, ClassifierError> {
    match file.model.as_str() {
        "decision_forest" => {
            let params: ForestParams = serde_json::from_value(file.params.clone())?;
            Ok(Box::new(DecisionForest::new(params, file.classes.clone())?))
        }
        "remote" => {
            let params: RemoteParams = serde_json::from_value(file.params.clone())?;
            let fallback = file
                .fallback
                .as_deref()
                .map(create_classifier)
                .transpose()?;
            Ok(Box::new(RemoteClassifier::new(
                params,
                file.classes.clone(),
                fallback,
            )?))
        }
        other => Err(ClassifierError::Invalid(format!("unknown model: {other}"))),
    }
}

pub fn load_classifier_from_path(
    path: impl AsRef<Path>,
) -> Result<Box<dyn Classifier>, ClassifierError> {
    let contents = std::fs::read_to_string(path)?;
    let file: ClassifierFile = serde_json::from_str(&contents)?;
    create_classifier(&file)
}
