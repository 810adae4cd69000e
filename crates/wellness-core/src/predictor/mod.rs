//! Wellness classification
//!
//! The serving core only needs a classifier's decision function, so trained
//! models are reached through the narrow [`Classifier`] trait. Two artifact
//! forms implement it: a JSON tree ensemble and an ONNX graph run with tract.

mod forest;
mod inference;

pub use forest::ForestClassifier;
pub use inference::OnnxClassifier;

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::PredictError;
use crate::models::FeatureVector;
use crate::transform::CategoryEncoder;

/// Trait for trained classifier implementations
pub trait Classifier: Send + Sync {
    /// Encoded class for a feature vector. Must be deterministic.
    fn predict(&self, features: &FeatureVector) -> Result<i64, PredictError>;

    /// Short name of the model family, for logs and metrics
    fn kind(&self) -> &'static str;
}

/// Runs the classifier and decodes its output through the label encoder
pub struct Predictor<'a> {
    classifier: &'a dyn Classifier,
    labels: &'a dyn CategoryEncoder,
}

impl<'a> Predictor<'a> {
    pub fn new(classifier: &'a dyn Classifier, labels: &'a dyn CategoryEncoder) -> Self {
        Self { classifier, labels }
    }

    /// Encoded label for a feature vector. A panic inside the classifier is
    /// reported as a classifier failure rather than unwinding into the caller.
    pub fn predict(&self, features: &FeatureVector) -> Result<i64, PredictError> {
        let classifier = self.classifier;
        catch_unwind(AssertUnwindSafe(|| classifier.predict(features))).unwrap_or_else(|_| {
            Err(PredictError::Classifier(format!(
                "{} classifier panicked",
                classifier.kind()
            )))
        })
    }

    pub fn decode_label(&self, encoded: i64) -> Result<&'a str, PredictError> {
        let labels = self.labels;
        labels
            .decode(encoded)
            .ok_or(PredictError::UnknownLabel(encoded))
    }
}

/// Index of the first maximum, ignoring NaN. `None` for an empty input.
pub(crate) fn argmax(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in values.into_iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}
