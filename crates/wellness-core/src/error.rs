//! Error types for the wellness inference core
//!
//! Each pipeline stage has its own error enum; the orchestrator folds them
//! into [`ServeError`], which is the only error a caller of the prediction
//! path ever sees.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the artifact bundle at startup. Always fatal.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("Required artifact '{name}' not found at {path}")]
    Missing { name: &'static str, path: PathBuf },

    #[error("Failed to read artifact '{name}' from {path}: {source}")]
    Unreadable {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deserialize artifact '{name}': {source}")]
    Malformed {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Checksum mismatch for {file}: manifest has {expected}, file hashes to {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to load ONNX classifier: {0}")]
    Onnx(String),

    #[error("Artifacts were already initialized; reload is not supported")]
    AlreadyInitialized,
}

impl ArtifactLoadError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Failure to turn a validated request into a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("Unseen department '{0}': not present in the training encoding table")]
    UnseenCategory(String),

    #[error("Cannot scale '{feature}': {reason}")]
    Scaling { feature: &'static str, reason: String },
}

/// Failure inside the predictor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("Classifier returned class {0}, outside the trained label range")]
    UnknownLabel(i64),
}

/// Coarse status class of a serving error, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    ClientError,
    ServerError,
    Unavailable,
}

/// Errors surfaced by the serving orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServeError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

impl ServeError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            ServeError::ServiceUnavailable(_) => StatusClass::Unavailable,
            ServeError::InvalidInput(_) => StatusClass::ClientError,
            ServeError::PredictionFailed(_) => StatusClass::ServerError,
        }
    }

    /// Stable machine-readable kind, used in error bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            ServeError::ServiceUnavailable(_) => "service_unavailable",
            ServeError::InvalidInput(_) => "invalid_input",
            ServeError::PredictionFailed(_) => "prediction_failed",
        }
    }

    /// Human-readable detail without the kind prefix
    pub fn detail(&self) -> &str {
        match self {
            ServeError::ServiceUnavailable(msg)
            | ServeError::InvalidInput(msg)
            | ServeError::PredictionFailed(msg) => msg,
        }
    }
}

impl From<TransformError> for ServeError {
    fn from(err: TransformError) -> Self {
        ServeError::InvalidInput(err.to_string())
    }
}

impl From<PredictError> for ServeError {
    fn from(err: PredictError) -> Self {
        ServeError::PredictionFailed(err.to_string())
    }
}
