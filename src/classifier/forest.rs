//! Decision forest loaded from a JSON artifact.
//!
//! Each tree is a flat node list rooted at index 0. A split sends the sample
//! left when `features[feature] <= threshold`; a leaf carries per-class counts.

use crate::recommend::model::{ClassPrediction, Classifier, ClassifierError, ScoredPrediction};
use serde::Deserialize;

pub const FEATURE_COUNT: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct ForestParams {
    pub trees: Vec<Vec<TreeNode>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionForest {
    trees: Vec<Vec<TreeNode>>,
    classes: Vec<String>,
}

impl DecisionForest {
    pub fn new(params: ForestParams, classes: Vec<String>) -> Result<Self, ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::Invalid("forest has no classes".to_string()));
        }
        if params.trees.is_empty() {
            return Err(ClassifierError::Invalid("forest has no trees".to_string()));
        }
        for (tree_index, tree) in params.trees.iter().enumerate() {
            validate_tree(tree_index, tree, classes.len())?;
        }
        Ok(Self {
            trees: params.trees,
            classes,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the normalized leaf distributions reached in every tree.
    pub fn distribution(&self, features: &[f64; FEATURE_COUNT]) -> Result<Vec<f64>, ClassifierError> {
        if features.iter().any(|value| !value.is_finite()) {
            return Err(ClassifierError::Invalid("non-finite feature".to_string()));
        }
        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let counts = walk(tree, features)?;
            let sum: f64 = counts.iter().sum();
            if sum <= 0.0 {
                continue;
            }
            for (total, count) in totals.iter_mut().zip(counts) {
                *total += count / sum;
            }
        }
        let trees = self.trees.len() as f64;
        Ok(totals.into_iter().map(|total| total / trees).collect())
    }
}

impl Classifier for DecisionForest {
    fn predict(&self, features: &[f64; 5]) -> Result<ClassPrediction, ClassifierError> {
        argmax(&self.distribution(features)?)
    }

    fn predict_probabilities(&self, features: &[f64; 5]) -> Result<Option<Vec<f64>>, ClassifierError> {
        self.distribution(features).map(Some)
    }

    fn classes(&self) -> Option<&[String]> {
        Some(&self.classes)
    }

    fn predict_with_probabilities(&self, features: &[f64; 5]) -> Result<ScoredPrediction, ClassifierError> {
        let distribution = self.distribution(features)?;
        let class = argmax(&distribution)?;
        Ok(ScoredPrediction {
            class,
            probabilities: Some(distribution),
        })
    }
}

/// First class with the highest probability.
fn argmax(distribution: &[f64]) -> Result<ClassPrediction, ClassifierError> {
    let mut best: Option<(usize, f64)> = None;
    for (index, probability) in distribution.iter().copied().enumerate() {
        match best {
            Some((_, current)) if probability <= current => {}
            _ => best = Some((index, probability)),
        }
    }
    best.map(|(index, _)| ClassPrediction::Index(index))
        .ok_or_else(|| ClassifierError::Invalid("empty distribution".to_string()))
}

fn validate_tree(tree_index: usize, tree: &[TreeNode], class_count: usize) -> Result<(), ClassifierError> {
    if tree.is_empty() {
        return Err(ClassifierError::Invalid(format!("tree {tree_index} is empty")));
    }
    for (node_index, node) in tree.iter().enumerate() {
        match node {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(ClassifierError::Invalid(format!(
                        "tree {tree_index} node {node_index}: feature {feature} out of range"
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ClassifierError::Invalid(format!(
                        "tree {tree_index} node {node_index}: non-finite threshold"
                    )));
                }
                // Children must point forward so traversal always terminates.
                for child in [*left, *right] {
                    if child <= node_index || child >= tree.len() {
                        return Err(ClassifierError::Invalid(format!(
                            "tree {tree_index} node {node_index}: child {child} out of range"
                        )));
                    }
                }
            }
            TreeNode::Leaf { value } => {
                if value.len() != class_count {
                    return Err(ClassifierError::Invalid(format!(
                        "tree {tree_index} node {node_index}: leaf has {} classes, expected {class_count}",
                        value.len()
                    )));
                }
                if value.iter().any(|count| !count.is_finite() || *count < 0.0) {
                    return Err(ClassifierError::Invalid(format!(
                        "tree {tree_index} node {node_index}: invalid leaf counts"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn walk<'a>(tree: &'a [TreeNode], features: &[f64; FEATURE_COUNT]) -> Result<&'a [f64], ClassifierError> {
    let mut index = 0;
    loop {
        match tree.get(index) {
            Some(TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            }) => {
                let value = features
                    .get(*feature)
                    .ok_or_else(|| ClassifierError::Invalid(format!("feature {feature} out of range")))?;
                index = if *value <= *threshold { *left } else { *right };
            }
            Some(TreeNode::Leaf { value }) => return Ok(value),
            None => return Err(ClassifierError::Invalid(format!("node {index} missing"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stump(feature: usize, threshold: f64, low: [f64; 2], high: [f64; 2]) -> Vec<TreeNode> {
        vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { value: low.to_vec() },
            TreeNode::Leaf { value: high.to_vec() },
        ]
    }

    fn classes() -> Vec<String> {
        vec!["rice".to_string(), "maize".to_string()]
    }

    #[test]
    fn averages_tree_distributions() -> Result<(), ClassifierError> {
        let forest = DecisionForest::new(
            ForestParams {
                trees: vec![
                    stump(0, 100.0, [10.0, 0.0], [0.0, 10.0]),
                    stump(4, 70.0, [1.0, 3.0], [3.0, 1.0]),
                ],
            },
            classes(),
        )?;

        let features = [150.0, 30.0, 100.0, 6.5, 80.0];
        let probabilities = forest.predict_probabilities(&features)?.unwrap_or_default();

        assert_relative_eq!(probabilities[0], 0.375);
        assert_relative_eq!(probabilities[1], 0.625);
        assert_eq!(forest.predict(&features)?, ClassPrediction::Index(1));
        Ok(())
    }

    #[test]
    fn scored_prediction_matches_separate_calls() -> Result<(), ClassifierError> {
        let forest = DecisionForest::new(
            ForestParams {
                trees: vec![stump(0, 100.0, [3.0, 1.0], [1.0, 3.0])],
            },
            classes(),
        )?;
        let features = [40.0, 30.0, 100.0, 6.5, 80.0];

        let scored = forest.predict_with_probabilities(&features)?;

        assert_eq!(scored.class, forest.predict(&features)?);
        assert_eq!(scored.probabilities, forest.predict_probabilities(&features)?);
        Ok(())
    }

    #[test]
    fn threshold_sends_equal_values_left() -> Result<(), ClassifierError> {
        let forest = DecisionForest::new(
            ForestParams {
                trees: vec![stump(0, 100.0, [1.0, 0.0], [0.0, 1.0])],
            },
            classes(),
        )?;

        assert_eq!(
            forest.predict(&[100.0, 0.0, 0.0, 0.0, 0.0])?,
            ClassPrediction::Index(0)
        );
        Ok(())
    }

    #[test]
    fn rejects_feature_index_outside_input() {
        let result = DecisionForest::new(
            ForestParams {
                trees: vec![stump(5, 1.0, [1.0, 0.0], [0.0, 1.0])],
            },
            classes(),
        );

        assert!(matches!(result, Err(ClassifierError::Invalid(_))));
    }

    #[test]
    fn rejects_leaf_width_mismatch() {
        let tree = vec![TreeNode::Leaf {
            value: vec![1.0, 2.0, 3.0],
        }];
        let result = DecisionForest::new(ForestParams { trees: vec![tree] }, classes());

        assert!(matches!(result, Err(ClassifierError::Invalid(_))));
    }

    #[test]
    fn rejects_backward_child_links() {
        let tree = vec![
            TreeNode::Split {
                feature: 0,
                threshold: 1.0,
                left: 0,
                right: 1,
            },
            TreeNode::Leaf { value: vec![1.0, 0.0] },
        ];
        let result = DecisionForest::new(ForestParams { trees: vec![tree] }, classes());

        assert!(matches!(result, Err(ClassifierError::Invalid(_))));
    }

    #[test]
    fn nodes_deserialize_from_json() -> Result<(), serde_json::Error> {
        let params: ForestParams = serde_json::from_str(
            r#"{"trees": [[
                {"feature": 3, "threshold": 6.0, "left": 1, "right": 2},
                {"value": [4, 1]},
                {"value": [0, 5]}
            ]]}"#,
        )?;

        assert_eq!(params.trees[0].len(), 3);
        assert!(matches!(params.trees[0][0], TreeNode::Split { feature: 3, .. }));
        Ok(())
    }
}
