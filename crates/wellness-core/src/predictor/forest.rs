//! Tree ensemble classifier
//!
//! Trees are stored as parallel node arrays, the way fitted decision trees
//! expose them: `children_left`, `children_right`, `feature`, `threshold` and
//! a per-node class distribution in `value`. A node whose children are both
//! `-1` is a leaf. Samples with `x[feature] <= threshold` go left.
//!
//! The ensemble averages the normalized leaf distributions of all trees and
//! predicts the class with the highest mean probability (first one on ties).

use serde::Deserialize;

use super::{argmax, Classifier};
use crate::error::{ArtifactLoadError, PredictError};
use crate::models::FeatureVector;
use crate::transform::FEATURE_COUNT;

const ARTIFACT: &str = "classifier";
const LEAF: i64 = -1;

#[derive(Debug, Deserialize)]
struct TreeArtifact {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForestArtifact {
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn from_artifact(
        tree_idx: usize,
        artifact: TreeArtifact,
        n_classes: usize,
    ) -> Result<Self, ArtifactLoadError> {
        let invalid = |reason: String| {
            ArtifactLoadError::invalid(ARTIFACT, format!("tree {}: {}", tree_idx, reason))
        };

        let n = artifact.children_left.len();
        if n == 0 {
            return Err(invalid("no nodes".to_string()));
        }
        if artifact.children_right.len() != n
            || artifact.feature.len() != n
            || artifact.threshold.len() != n
            || artifact.value.len() != n
        {
            return Err(invalid("node arrays have different lengths".to_string()));
        }

        let mut nodes = Vec::with_capacity(n);
        for idx in 0..n {
            let left = artifact.children_left[idx];
            let right = artifact.children_right[idx];

            if left == LEAF && right == LEAF {
                let row = &artifact.value[idx];
                if row.len() != n_classes {
                    return Err(invalid(format!(
                        "leaf {} has {} class weights, expected {}",
                        idx,
                        row.len(),
                        n_classes
                    )));
                }
                if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(invalid(format!("leaf {} has invalid class weights", idx)));
                }
                let total: f64 = row.iter().sum();
                if total <= 0.0 {
                    return Err(invalid(format!("leaf {} has an empty distribution", idx)));
                }
                nodes.push(Node::Leaf {
                    proba: row.iter().map(|w| w / total).collect(),
                });
                continue;
            }

            // Children always come after their parent, which rules out cycles.
            let child = |c: i64| -> Option<usize> {
                usize::try_from(c).ok().filter(|c| *c > idx && *c < n)
            };
            let (left, right) = match (child(left), child(right)) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(invalid(format!(
                        "node {} has invalid children ({}, {})",
                        idx, left, right
                    )))
                }
            };

            let feature = usize::try_from(artifact.feature[idx])
                .ok()
                .filter(|f| *f < FEATURE_COUNT)
                .ok_or_else(|| {
                    invalid(format!(
                        "node {} splits on feature {}",
                        idx, artifact.feature[idx]
                    ))
                })?;

            let threshold = artifact.threshold[idx];
            if !threshold.is_finite() {
                return Err(invalid(format!("node {} has a non-finite threshold", idx)));
            }

            nodes.push(Node::Split {
                feature,
                threshold,
                left,
                right,
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Averaging ensemble of decision trees
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let artifact: ForestArtifact = serde_json::from_slice(bytes).map_err(|source| {
            ArtifactLoadError::Malformed {
                name: ARTIFACT,
                source,
            }
        })?;

        if artifact.n_features != FEATURE_COUNT {
            return Err(ArtifactLoadError::invalid(
                ARTIFACT,
                format!(
                    "model expects {} features, serving schema has {}",
                    artifact.n_features, FEATURE_COUNT
                ),
            ));
        }
        if artifact.classes.is_empty() {
            return Err(ArtifactLoadError::invalid(ARTIFACT, "model has no classes"));
        }
        if artifact.trees.is_empty() {
            return Err(ArtifactLoadError::invalid(ARTIFACT, "model has no trees"));
        }

        let n_classes = artifact.classes.len();
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(idx, tree)| DecisionTree::from_artifact(idx, tree, n_classes))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            classes: artifact.classes,
            trees,
        })
    }

    /// Mean class probabilities, in `classes` order
    pub fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let x = features.as_slice();
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_proba(x)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64, PredictError> {
        let proba = self.predict_proba(features);
        argmax(proba)
            .map(|idx| self.classes[idx])
            .ok_or_else(|| PredictError::Classifier("no class scores produced".to_string()))
    }

    fn kind(&self) -> &'static str {
        "forest"
    }
}
