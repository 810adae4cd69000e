//! Trained artifact bundle
//!
//! Everything the serving path needs from the offline training pipeline is
//! loaded here, once, from a directory of persisted artifacts:
//!
//! | logical name         | file                                        |
//! |----------------------|---------------------------------------------|
//! | `classifier`         | `classifier.onnx`, else `classifier.json`   |
//! | `scaler`             | `scaler.json`                               |
//! | `department_encoder` | `department_encoder.json`                   |
//! | `label_encoder`      | `label_encoder.json`                        |
//! | `resources`          | `resources.json`                            |
//!
//! After loading the bundle is never mutated.

mod manifest;
mod slot;

pub use manifest::{compute_checksum, Manifest, MANIFEST_FILE, UNVERSIONED};
pub use slot::{ArtifactSlot, ArtifactStatus};

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ArtifactLoadError;
use crate::predictor::{Classifier, ForestClassifier, OnnxClassifier, Predictor};
use crate::resources::ResourceLibrary;
use crate::transform::{
    CategoryEncoder, FeatureScaler, FeatureTransformer, LabelEncoder, StandardScaler,
};

/// Logical artifact names
pub mod names {
    pub const CLASSIFIER: &str = "classifier";
    pub const SCALER: &str = "scaler";
    pub const DEPARTMENT_ENCODER: &str = "department_encoder";
    pub const LABEL_ENCODER: &str = "label_encoder";
    pub const RESOURCES: &str = "resources";
}

/// Immutable set of trained transforms, classifier and resource library
pub struct ArtifactBundle {
    classifier: Box<dyn Classifier>,
    scaler: Box<dyn FeatureScaler>,
    department_encoder: Box<dyn CategoryEncoder>,
    label_encoder: Box<dyn CategoryEncoder>,
    resources: ResourceLibrary,
    version: String,
}

impl ArtifactBundle {
    pub fn from_parts(
        classifier: Box<dyn Classifier>,
        scaler: Box<dyn FeatureScaler>,
        department_encoder: Box<dyn CategoryEncoder>,
        label_encoder: Box<dyn CategoryEncoder>,
        resources: ResourceLibrary,
    ) -> Self {
        Self {
            classifier,
            scaler,
            department_encoder,
            label_encoder,
            resources,
            version: UNVERSIONED.to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Load every artifact from `dir`. Any missing, unreadable, malformed or
    /// tampered artifact fails the whole load.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let dir = dir.as_ref();
        debug!(dir = %dir.display(), "Loading artifact bundle");

        let manifest = Manifest::read(dir)?;
        if let Some(manifest) = &manifest {
            manifest.verify(dir)?;
        }

        let classifier = load_classifier(dir)?;
        let scaler = StandardScaler::from_json(&read_artifact(dir, names::SCALER, "scaler.json")?)?;
        let department_encoder = LabelEncoder::from_json(
            names::DEPARTMENT_ENCODER,
            &read_artifact(dir, names::DEPARTMENT_ENCODER, "department_encoder.json")?,
        )?;
        let label_encoder = LabelEncoder::from_json(
            names::LABEL_ENCODER,
            &read_artifact(dir, names::LABEL_ENCODER, "label_encoder.json")?,
        )?;
        let resources =
            ResourceLibrary::from_json(&read_artifact(dir, names::RESOURCES, "resources.json")?)?;

        check_resource_coverage(&label_encoder, &resources);

        let bundle = Self::from_parts(
            classifier,
            Box::new(scaler),
            Box::new(department_encoder),
            Box::new(label_encoder),
            resources,
        );

        Ok(match manifest {
            Some(manifest) => bundle.with_version(manifest.version()),
            None => bundle,
        })
    }

    pub fn transformer(&self) -> FeatureTransformer<'_> {
        FeatureTransformer::new(self.department_encoder.as_ref(), self.scaler.as_ref())
    }

    pub fn predictor(&self) -> Predictor<'_> {
        Predictor::new(self.classifier.as_ref(), self.label_encoder.as_ref())
    }

    pub fn resources(&self) -> &ResourceLibrary {
        &self.resources
    }

    pub fn departments(&self) -> &[String] {
        self.department_encoder.classes()
    }

    pub fn labels(&self) -> &[String] {
        self.label_encoder.classes()
    }

    pub fn classifier_kind(&self) -> &'static str {
        self.classifier.kind()
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("classifier", &self.classifier.kind())
            .field("departments", &self.departments())
            .field("labels", &self.labels())
            .field("resources", &self.resources.len())
            .field("version", &self.version)
            .finish()
    }
}

fn read_artifact(dir: &Path, name: &'static str, file: &str) -> Result<Vec<u8>, ArtifactLoadError> {
    let path = dir.join(file);
    fs::read(&path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ArtifactLoadError::Missing { name, path },
        _ => ArtifactLoadError::Unreadable { name, path, source },
    })
}

fn load_classifier(dir: &Path) -> Result<Box<dyn Classifier>, ArtifactLoadError> {
    let onnx_path: PathBuf = dir.join("classifier.onnx");
    if onnx_path.is_file() {
        let bytes = read_artifact(dir, names::CLASSIFIER, "classifier.onnx")?;
        return Ok(Box::new(OnnxClassifier::from_bytes(&bytes)?));
    }

    let bytes = read_artifact(dir, names::CLASSIFIER, "classifier.json")?;
    Ok(Box::new(ForestClassifier::from_json(&bytes)?))
}

/// A trained label without curated resources is served with an empty list;
/// flag it at startup so the gap is visible.
fn check_resource_coverage(labels: &LabelEncoder, resources: &ResourceLibrary) {
    for label in labels.classes() {
        if !resources.contains(label) {
            warn!(label = %label, "No resources curated for trained label");
        }
    }
    for label in resources.labels() {
        if labels.encode(label).is_none() {
            warn!(label = %label, "Resource library entry for a label the model never predicts");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_load_fixture_bundle() {
        let bundle = ArtifactBundle::load(fixture_dir()).unwrap();
        assert_eq!(bundle.classifier_kind(), "forest");
        assert_eq!(bundle.labels(), &["Burnout", "Healthy", "Stressed"]);
        assert_eq!(bundle.departments().len(), 5);
        assert_eq!(bundle.resources().len(), 3);
        assert_eq!(bundle.version(), UNVERSIONED);
    }

    #[test]
    fn test_missing_artifact_fails() {
        let dir = copy_fixtures();
        fs::remove_file(dir.path().join("label_encoder.json")).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactLoadError::Missing { name: names::LABEL_ENCODER, .. }
        ));
    }

    #[test]
    fn test_missing_classifier_fails() {
        let dir = copy_fixtures();
        fs::remove_file(dir.path().join("classifier.json")).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactLoadError::Missing { name: names::CLASSIFIER, .. }
        ));
    }

    #[test]
    fn test_corrupt_artifact_fails() {
        let dir = copy_fixtures();
        fs::write(dir.path().join("scaler.json"), b"{\"feature_names\": [").unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactLoadError::Malformed { name: names::SCALER, .. }
        ));
    }

    #[test]
    fn test_manifest_version_and_checksums() {
        let dir = copy_fixtures();
        let scaler = fs::read(dir.path().join("scaler.json")).unwrap();
        let manifest = format!(
            r#"{{"version": "2024-05-01", "checksums": {{"scaler.json": "{}"}}}}"#,
            compute_checksum(&scaler)
        );
        fs::write(dir.path().join(MANIFEST_FILE), manifest).unwrap();

        let bundle = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(bundle.version(), "2024-05-01");

        let mut tampered = scaler.clone();
        tampered.push(b'\n');
        fs::write(dir.path().join("scaler.json"), tampered).unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_corrupt_onnx_takes_precedence_and_fails() {
        let dir = copy_fixtures();
        fs::write(dir.path().join("classifier.onnx"), b"not a model").unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Onnx(_)));
    }
}
