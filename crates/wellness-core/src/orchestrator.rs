//! Serving orchestrator
//!
//! Drives one prediction request through validation, feature transformation,
//! classification and resource resolution. Every request walks the same
//! stage sequence and either reaches [`Stage::Responded`] or stops with a
//! [`ServeError`] that records the last stage it completed.

use std::sync::Arc;
use std::time::Instant;

use crate::artifacts::{ArtifactBundle, ArtifactSlot, ArtifactStatus};
use crate::error::ServeError;
use crate::models::{PredictionRequest, PredictionResponse};
use crate::observability::{ServingMetrics, StructuredLogger};

/// Request lifecycle stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Transformed,
    Predicted,
    Resolved,
    Responded,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Transformed => "transformed",
            Stage::Predicted => "predicted",
            Stage::Resolved => "resolved",
            Stage::Responded => "responded",
        }
    }
}

/// Early exit from the pipeline: the error and the last stage reached
#[derive(Debug)]
struct Failure {
    stage: Stage,
    error: ServeError,
}

impl Failure {
    fn new(stage: Stage, error: impl Into<ServeError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

/// Prediction entry point shared by the HTTP handler and offline evaluation
#[derive(Clone)]
pub struct ServingOrchestrator {
    artifacts: Arc<ArtifactSlot>,
    metrics: ServingMetrics,
    logger: StructuredLogger,
}

impl ServingOrchestrator {
    pub fn new(
        artifacts: Arc<ArtifactSlot>,
        metrics: ServingMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            artifacts,
            metrics,
            logger,
        }
    }

    /// The slot this orchestrator serves from, for components that observe it
    pub fn artifacts(&self) -> &Arc<ArtifactSlot> {
        &self.artifacts
    }

    /// Predict for an already-deserialized request
    pub fn handle(&self, request: &PredictionRequest) -> Result<PredictionResponse, ServeError> {
        let start = Instant::now();
        let outcome = self
            .bundle()
            .and_then(|bundle| self.run(bundle, request).map(|r| (r, request.department.as_str())));
        self.finish(start, outcome)
    }

    /// Predict for a raw JSON request body. Artifact availability is checked
    /// before the body is parsed.
    pub fn handle_json(&self, body: &[u8]) -> Result<PredictionResponse, ServeError> {
        let start = Instant::now();
        let bundle = match self.bundle() {
            Ok(bundle) => bundle,
            Err(failure) => return self.finish(start, Err(failure)),
        };

        let request: PredictionRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                let failure = Failure::new(
                    Stage::Received,
                    ServeError::InvalidInput(format!("Malformed request body: {}", e)),
                );
                return self.finish(start, Err(failure));
            }
        };

        let outcome = self
            .run(bundle, &request)
            .map(|r| (r, request.department.as_str()));
        self.finish(start, outcome)
    }

    fn bundle(&self) -> Result<&ArtifactBundle, Failure> {
        match self.artifacts.status() {
            ArtifactStatus::Loaded(bundle) => Ok(bundle),
            ArtifactStatus::Uninitialized => Err(Failure::new(
                Stage::Received,
                ServeError::ServiceUnavailable("Model artifacts are not loaded".to_string()),
            )),
            ArtifactStatus::Failed(_) => Err(Failure::new(
                Stage::Received,
                ServeError::ServiceUnavailable("Model artifacts failed to load".to_string()),
            )),
        }
    }

    fn run(
        &self,
        bundle: &ArtifactBundle,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, Failure> {
        request
            .validate()
            .map_err(|reason| Failure::new(Stage::Received, ServeError::InvalidInput(reason)))?;
        reached(Stage::Validated);

        let features = bundle
            .transformer()
            .transform(request)
            .map_err(|e| Failure::new(Stage::Validated, e))?;
        reached(Stage::Transformed);

        let predictor = bundle.predictor();
        let label = predictor
            .predict(&features)
            .and_then(|encoded| predictor.decode_label(encoded))
            .map_err(|e| Failure::new(Stage::Transformed, e))?;
        reached(Stage::Predicted);

        // Resolution cannot fail: unknown labels resolve to no resources.
        let recommended_resources = bundle.resources().resolve(label);
        reached(Stage::Resolved);

        Ok(PredictionResponse {
            wellness_label: label.to_string(),
            recommended_resources,
        })
    }

    fn finish(
        &self,
        start: Instant,
        outcome: Result<(PredictionResponse, &str), Failure>,
    ) -> Result<PredictionResponse, ServeError> {
        let elapsed = start.elapsed();
        match outcome {
            Ok((response, department)) => {
                self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
                self.metrics.inc_predictions(&response.wellness_label);
                self.logger.log_prediction(
                    department,
                    &response.wellness_label,
                    response.recommended_resources.len(),
                    elapsed.as_micros() as u64,
                );
                reached(Stage::Responded);
                Ok(response)
            }
            Err(Failure { stage, error }) => {
                self.metrics.inc_prediction_errors(error.kind());
                self.logger
                    .log_rejection(error.kind(), stage.as_str(), error.detail());
                Err(error)
            }
        }
    }
}

fn reached(stage: Stage) {
    tracing::trace!(stage = stage.as_str(), "Request stage reached");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArtifactLoadError, PredictError};
    use crate::models::FeatureVector;
    use crate::predictor::Classifier;
    use crate::resources::ResourceLibrary;
    use crate::transform::{ColumnStats, FeatureColumn, LabelEncoder, StandardScaler};
    use std::path::PathBuf;

    fn fixture_slot() -> Arc<ArtifactSlot> {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/artifacts");
        Arc::new(ArtifactSlot::loaded(ArtifactBundle::load(dir).unwrap()))
    }

    fn orchestrator(slot: Arc<ArtifactSlot>) -> ServingOrchestrator {
        ServingOrchestrator::new(slot, ServingMetrics::new(), StructuredLogger::new("test"))
    }

    fn stressed_request() -> PredictionRequest {
        PredictionRequest {
            focus_session_length_minutes: 35.0,
            break_frequency_per_hour: 0.5,
            after_hours_activity_minutes: 60.0,
            communication_sentiment_score: 0.5,
            department: "sales".to_string(),
        }
    }

    struct FixedClassifier(i64);

    impl Classifier for FixedClassifier {
        fn predict(&self, _features: &FeatureVector) -> Result<i64, PredictError> {
            Ok(self.0)
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    fn bundle_with_classifier(classifier: FixedClassifier) -> ArtifactBundle {
        let unit = ColumnStats {
            mean: 0.0,
            std: 1.0,
        };
        let scaler = StandardScaler::new(&FeatureColumn::NUMERIC.map(|c| (c, unit))).unwrap();
        let departments = LabelEncoder::from_classes("department_encoder", vec!["sales".into()])
            .unwrap();
        let labels =
            LabelEncoder::from_classes("label_encoder", vec!["Healthy".into(), "Stressed".into()])
                .unwrap();
        ArtifactBundle::from_parts(
            Box::new(classifier),
            Box::new(scaler),
            Box::new(departments),
            Box::new(labels),
            ResourceLibrary::new(Default::default()).unwrap(),
        )
    }

    #[test]
    fn test_end_to_end_stressed() {
        let orchestrator = orchestrator(fixture_slot());
        let response = orchestrator.handle(&stressed_request()).unwrap();

        assert_eq!(response.wellness_label, "Stressed");
        assert!(!response.recommended_resources.is_empty());
    }

    #[test]
    fn test_handle_is_deterministic() {
        let orchestrator = orchestrator(fixture_slot());
        let first = orchestrator.handle(&stressed_request()).unwrap();
        for _ in 0..10 {
            assert_eq!(orchestrator.handle(&stressed_request()).unwrap(), first);
        }
    }

    #[test]
    fn test_json_field_order_does_not_matter() {
        let orchestrator = orchestrator(fixture_slot());
        let reordered = br#"{
            "department": "sales",
            "communication_sentiment_score": 0.5,
            "after_hours_activity_minutes": 60,
            "break_frequency_per_hour": 0.5,
            "focus_session_length_minutes": 35
        }"#;

        let from_json = orchestrator.handle_json(reordered).unwrap();
        let from_struct = orchestrator.handle(&stressed_request()).unwrap();
        assert_eq!(from_json, from_struct);
    }

    #[test]
    fn test_unseen_department_is_invalid_input() {
        let orchestrator = orchestrator(fixture_slot());
        let mut request = stressed_request();
        request.department = "legal".to_string();

        let err = orchestrator.handle(&request).unwrap_err();
        assert!(matches!(err, ServeError::InvalidInput(_)));
        assert!(err.detail().contains("legal"));
    }

    #[test]
    fn test_department_matching_is_exact() {
        let orchestrator = orchestrator(fixture_slot());
        for department in ["Sales", " sales", "sales ", ""] {
            let mut request = stressed_request();
            request.department = department.to_string();
            assert!(matches!(
                orchestrator.handle(&request),
                Err(ServeError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_out_of_range_values_are_invalid_input() {
        let orchestrator = orchestrator(fixture_slot());
        let mut request = stressed_request();
        request.communication_sentiment_score = 1.5;
        assert!(matches!(
            orchestrator.handle(&request),
            Err(ServeError::InvalidInput(_))
        ));

        let mut request = stressed_request();
        request.break_frequency_per_hour = -0.1;
        assert!(matches!(
            orchestrator.handle(&request),
            Err(ServeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_invalid_input() {
        let orchestrator = orchestrator(fixture_slot());
        let bodies: [&[u8]; 4] = [
            b"",
            b"not json",
            br#"{"department": "sales"}"#,
            br#"{"focus_session_length_minutes": "35", "break_frequency_per_hour": 0.5,
                "after_hours_activity_minutes": 60, "communication_sentiment_score": 0.5,
                "department": "sales"}"#,
        ];
        for body in bodies {
            assert!(matches!(
                orchestrator.handle_json(body),
                Err(ServeError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_unavailable_before_load_for_every_shape() {
        let orchestrator = orchestrator(Arc::new(ArtifactSlot::new()));

        assert!(matches!(
            orchestrator.handle(&stressed_request()),
            Err(ServeError::ServiceUnavailable(_))
        ));

        let bodies: [&[u8]; 3] = [b"", b"garbage", br#"{"department": "legal"}"#];
        for body in bodies {
            assert!(matches!(
                orchestrator.handle_json(body),
                Err(ServeError::ServiceUnavailable(_))
            ));
        }
    }

    #[test]
    fn test_unavailable_after_failed_load() {
        let slot = Arc::new(ArtifactSlot::new());
        slot.initialize(Err(ArtifactLoadError::invalid("scaler", "truncated")))
            .unwrap_err();
        let orchestrator = orchestrator(slot);

        let err = orchestrator.handle(&stressed_request()).unwrap_err();
        assert!(matches!(err, ServeError::ServiceUnavailable(_)));
        assert!(!err.detail().contains("truncated"));
    }

    #[test]
    fn test_unknown_label_is_prediction_failed() {
        let slot = Arc::new(ArtifactSlot::loaded(bundle_with_classifier(
            FixedClassifier(5),
        )));
        let orchestrator = orchestrator(slot);

        let err = orchestrator.handle(&stressed_request()).unwrap_err();
        assert!(matches!(err, ServeError::PredictionFailed(_)));
    }

    #[test]
    fn test_label_without_resources_returns_empty_list() {
        let slot = Arc::new(ArtifactSlot::loaded(bundle_with_classifier(
            FixedClassifier(0),
        )));
        let orchestrator = orchestrator(slot);

        let response = orchestrator.handle(&stressed_request()).unwrap();
        assert_eq!(response.wellness_label, "Healthy");
        assert!(response.recommended_resources.is_empty());
    }

    #[test]
    fn test_stage_names() {
        let names: Vec<&str> = [
            Stage::Received,
            Stage::Validated,
            Stage::Transformed,
            Stage::Predicted,
            Stage::Resolved,
            Stage::Responded,
        ]
        .iter()
        .map(Stage::as_str)
        .collect();
        assert_eq!(
            names,
            ["received", "validated", "transformed", "predicted", "resolved", "responded"]
        );
    }
}
