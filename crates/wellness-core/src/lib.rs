//! Wellness inference core
//!
//! This crate provides the serving-time half of the wellness classifier:
//! - Loading the trained artifact bundle (encoders, scaler, classifier, resources)
//! - Reproducing the training-time feature transforms in a fixed column order
//! - Classification and label decoding
//! - Resource resolution and the request orchestrator
//! - Offline evaluation, health checks and observability

pub mod artifacts;
pub mod error;
pub mod evaluation;
pub mod health;
pub mod models;
pub mod observability;
pub mod orchestrator;
pub mod predictor;
pub mod resources;
pub mod transform;

pub use artifacts::{ArtifactBundle, ArtifactSlot, ArtifactStatus};
pub use error::{ArtifactLoadError, PredictError, ServeError, StatusClass, TransformError};
pub use evaluation::{evaluate, EvaluationReport, LabeledRecord};
pub use health::{
    ComponentHealth, ComponentStatus, HealthMonitor, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServingMetrics, StructuredLogger};
pub use orchestrator::{ServingOrchestrator, Stage};
pub use resources::ResourceLibrary;
