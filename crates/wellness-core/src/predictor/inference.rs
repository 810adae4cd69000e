//! ONNX classifier inference using tract
//!
//! Loads an exported classifier graph with a single `[1, 5]` f32 input. The
//! first graph output is read either as an int64 label tensor or as f32
//! class scores, in which case the highest score wins.

use std::time::Instant;

use tract_onnx::prelude::*;
use tracing::{debug, warn};

use super::{argmax, Classifier};
use crate::error::{ArtifactLoadError, PredictError};
use crate::models::FeatureVector;
use crate::transform::FEATURE_COUNT;

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based classifier
pub struct OnnxClassifier {
    model: TractModel,
}

impl OnnxClassifier {
    /// Create a classifier from ONNX model bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let model =
            Self::load_model(model_bytes).map_err(|e| ArtifactLoadError::Onnx(format!("{:#}", e)))?;
        Ok(Self { model })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8]) -> TractResult<TractModel> {
        tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))?
            .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())?
            .into_optimized()?
            .into_runnable()
    }

    /// Convert feature vector to tensor input
    fn features_to_tensor(features: &FeatureVector) -> Result<Tensor, PredictError> {
        let data: Vec<f32> = features.as_slice().iter().map(|v| *v as f32).collect();
        tract_ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), data)
            .map(Tensor::from)
            .map_err(|e| PredictError::Classifier(format!("Failed to build input tensor: {}", e)))
    }

    /// Read the encoded label from the first model output
    fn output_to_label(output: &Tensor) -> Result<i64, PredictError> {
        if output.datum_type() == i64::datum_type() {
            let labels = output
                .as_slice::<i64>()
                .map_err(|e| PredictError::Classifier(format!("{:#}", e)))?;
            return labels
                .first()
                .copied()
                .ok_or_else(|| PredictError::Classifier("Model returned no label".to_string()));
        }

        let scores = output
            .as_slice::<f32>()
            .map_err(|e| PredictError::Classifier(format!("Unsupported model output: {:#}", e)))?;
        argmax(scores.iter().map(|s| *s as f64))
            .map(|idx| idx as i64)
            .ok_or_else(|| PredictError::Classifier("Model returned no scores".to_string()))
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64, PredictError> {
        let start = Instant::now();

        let input = Self::features_to_tensor(features)?;
        let result = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PredictError::Classifier(format!("{:#}", e)))?;
        let output = result
            .first()
            .ok_or_else(|| PredictError::Classifier("No output from model".to_string()))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        Self::output_to_label(output)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::schema::assemble;

    #[test]
    fn test_invalid_model_bytes_rejected() {
        let err = OnnxClassifier::from_bytes(b"definitely not protobuf").err();
        assert!(matches!(err, Some(ArtifactLoadError::Onnx(_))));
    }

    #[test]
    fn test_features_to_tensor_shape() {
        let features = assemble(&[1.0, 2.0, 3.0, 4.0], 5.0);
        let tensor = OnnxClassifier::features_to_tensor(&features).unwrap();
        assert_eq!(tensor.shape(), &[1, FEATURE_COUNT]);
        assert_eq!(tensor.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_label_output() {
        let output = Tensor::from(tract_ndarray::arr1(&[2i64]));
        assert_eq!(OnnxClassifier::output_to_label(&output).unwrap(), 2);
    }

    #[test]
    fn test_score_output_argmax() {
        let output = Tensor::from(tract_ndarray::arr2(&[[0.1f32, 0.7, 0.2]]));
        assert_eq!(OnnxClassifier::output_to_label(&output).unwrap(), 1);
    }
}
