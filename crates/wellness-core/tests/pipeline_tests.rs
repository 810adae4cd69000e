//! End-to-end tests for the serving pipeline against the checked-in
//! fixture artifacts

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use wellness_core::transform::{FeatureColumn, FeatureScaler, StandardScaler, FEATURE_ORDER};
use wellness_core::{
    ArtifactBundle, ArtifactLoadError, ArtifactSlot, PredictionRequest, ServeError,
    ServingMetrics, ServingOrchestrator, StructuredLogger,
};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/artifacts")
}

fn copy_fixtures() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in fs::read_dir(fixture_dir()).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn orchestrator() -> ServingOrchestrator {
    let bundle = ArtifactBundle::load(fixture_dir()).unwrap();
    ServingOrchestrator::new(
        Arc::new(ArtifactSlot::loaded(bundle)),
        ServingMetrics::new(),
        StructuredLogger::new("pipeline-tests"),
    )
}

fn request(values: [f64; 4], department: &str) -> PredictionRequest {
    PredictionRequest {
        focus_session_length_minutes: values[0],
        break_frequency_per_hour: values[1],
        after_hours_activity_minutes: values[2],
        communication_sentiment_score: values[3],
        department: department.to_string(),
    }
}

#[test]
fn test_reference_request_is_stressed() {
    let response = orchestrator()
        .handle(&request([35.0, 0.5, 60.0, 0.5], "sales"))
        .unwrap();

    assert_eq!(response.wellness_label, "Stressed");
    assert!(!response.recommended_resources.is_empty());
}

#[test]
fn test_profile_centers() {
    let orchestrator = orchestrator();
    let cases = [
        ([50.0, 1.2, 15.0, 0.8], "Healthy"),
        ([35.0, 0.5, 60.0, 0.5], "Stressed"),
        ([20.0, 0.2, 90.0, 0.3], "Burnout"),
    ];

    for department in ["engineering", "hr", "marketing", "product", "sales"] {
        for (values, expected) in cases {
            let response = orchestrator.handle(&request(values, department)).unwrap();
            assert_eq!(response.wellness_label, expected, "{} / {:?}", department, values);
        }
    }
}

#[test]
fn test_resources_are_returned_verbatim_and_in_order() {
    let library: serde_json::Value =
        serde_json::from_slice(&fs::read(fixture_dir().join("resources.json")).unwrap()).unwrap();

    let response = orchestrator()
        .handle(&request([35.0, 0.5, 60.0, 0.5], "sales"))
        .unwrap();

    let served = serde_json::to_value(&response.recommended_resources).unwrap();
    assert_eq!(served, library["Stressed"]);
}

#[test]
fn test_scaling_sanity_against_fixture_stats() {
    let scaler =
        StandardScaler::from_json(&fs::read(fixture_dir().join("scaler.json")).unwrap()).unwrap();

    for column in FeatureColumn::NUMERIC {
        let stats = scaler.stats(column).unwrap();
        let at_mean = scaler.transform(column, stats.mean).unwrap();
        let one_std = scaler.transform(column, stats.mean + stats.std).unwrap();
        assert!(at_mean.abs() < 1e-9);
        assert!((one_std - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_department_is_last_column() {
    assert_eq!(FEATURE_ORDER[FEATURE_ORDER.len() - 1], FeatureColumn::Department);
    assert_eq!(&FEATURE_ORDER[..4], &FeatureColumn::NUMERIC);
}

#[test]
fn test_reordered_scaler_columns_rejected_at_load() {
    let dir = copy_fixtures();
    fs::write(
        dir.path().join("scaler.json"),
        r#"{
            "feature_names": ["break_frequency_per_hour", "focus_session_length_minutes",
                              "after_hours_activity_minutes", "communication_sentiment_score"],
            "mean": [0.6, 35.0, 55.0, 0.5],
            "scale": [0.5, 16.0, 40.0, 0.25]
        }"#,
    )
    .unwrap();

    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Invalid { .. }));
}

#[test]
fn test_malformed_tree_rejected_at_load() {
    let dir = copy_fixtures();
    fs::write(
        dir.path().join("classifier.json"),
        r#"{
            "n_features": 5,
            "classes": [0, 1, 2],
            "trees": [{
                "children_left":  [0, -1],
                "children_right": [1, -1],
                "feature":        [0, -2],
                "threshold":      [0.0, -2.0],
                "value": [[1, 1, 1], [1, 0, 0]]
            }]
        }"#,
    )
    .unwrap();

    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    assert!(matches!(err, ArtifactLoadError::Invalid { .. }));
}

#[test]
fn test_zero_std_surfaces_at_request_time() {
    let dir = copy_fixtures();
    fs::write(
        dir.path().join("scaler.json"),
        r#"{
            "feature_names": ["focus_session_length_minutes", "break_frequency_per_hour",
                              "after_hours_activity_minutes", "communication_sentiment_score"],
            "mean": [35.0, 0.6, 55.0, 0.5],
            "scale": [16.0, 0.0, 40.0, 0.25]
        }"#,
    )
    .unwrap();

    let bundle = ArtifactBundle::load(dir.path()).unwrap();
    let orchestrator = ServingOrchestrator::new(
        Arc::new(ArtifactSlot::loaded(bundle)),
        ServingMetrics::new(),
        StructuredLogger::new("pipeline-tests"),
    );

    let err = orchestrator
        .handle(&request([35.0, 0.5, 60.0, 0.5], "sales"))
        .unwrap_err();
    assert!(matches!(err, ServeError::InvalidInput(_)));
    assert!(err.detail().contains("break_frequency_per_hour"));
}

#[test]
fn test_concurrent_requests_share_bundle() {
    let orchestrator = orchestrator();
    let expected = orchestrator
        .handle(&request([35.0, 0.5, 60.0, 0.5], "sales"))
        .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    orchestrator
                        .handle(&request([35.0, 0.5, 60.0, 0.5], "sales"))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
