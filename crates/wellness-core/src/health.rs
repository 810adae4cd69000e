//! Liveness and readiness for the inference service
//!
//! Artifact health and readiness are read straight from the [`ArtifactSlot`],
//! so they can never disagree with what the orchestrator serves. Predictor
//! health follows recent request outcomes: a prediction failure degrades it
//! and the next successful prediction restores it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::artifacts::{ArtifactSlot, ArtifactStatus};

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, but recent requests failed
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Healthy => "healthy",
            ComponentStatus::Degraded => "degraded",
            ComponentStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>, timestamp: i64) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: timestamp,
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    fn from_components(components: HashMap<String, ComponentHealth>) -> Self {
        let status = components
            .values()
            .map(|c| c.status)
            .max_by_key(|status| match status {
                ComponentStatus::Healthy => 0,
                ComponentStatus::Degraded => 1,
                ComponentStatus::Unhealthy => 2,
            })
            .unwrap_or(ComponentStatus::Healthy);
        Self { status, components }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names reported by `/healthz`
pub mod components {
    pub const ARTIFACTS: &str = "artifacts";
    pub const PREDICTOR: &str = "predictor";
}

/// Outcome tracking for the predictor component
#[derive(Debug, Default)]
struct PredictorOutcomes {
    consecutive_failures: AtomicU64,
    /// Unix seconds of the last recorded outcome, 0 before any
    last_outcome_at: AtomicI64,
    last_failure: RwLock<Option<String>>,
}

/// Derives service health from the artifact slot and prediction outcomes
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    artifacts: Arc<ArtifactSlot>,
    predictor: Arc<PredictorOutcomes>,
}

impl HealthMonitor {
    pub fn new(artifacts: Arc<ArtifactSlot>) -> Self {
        Self {
            artifacts,
            predictor: Arc::new(PredictorOutcomes::default()),
        }
    }

    /// Record a served prediction. Clears any earlier degradation.
    pub async fn record_success(&self) {
        let outcomes = &self.predictor;
        outcomes
            .last_outcome_at
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);

        let failures = outcomes.consecutive_failures.swap(0, Ordering::Relaxed);
        if failures > 0 {
            *outcomes.last_failure.write().await = None;
            info!(
                component = components::PREDICTOR,
                failures, "Predictor recovered after failures"
            );
        }
    }

    /// Record a prediction that failed inside the classifier or label decoding
    pub async fn record_failure(&self, detail: &str) {
        let outcomes = &self.predictor;
        outcomes
            .last_outcome_at
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);

        let failures = outcomes.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        *outcomes.last_failure.write().await = Some(detail.to_string());
        if failures == 1 {
            warn!(component = components::PREDICTOR, detail, "Predictor degraded");
        }
    }

    fn artifacts_health(&self, now: i64) -> ComponentHealth {
        match self.artifacts.status() {
            ArtifactStatus::Loaded(bundle) => ComponentHealth::new(
                ComponentStatus::Healthy,
                Some(format!(
                    "Serving bundle {} ({})",
                    bundle.version(),
                    bundle.classifier_kind()
                )),
                now,
            ),
            ArtifactStatus::Uninitialized => ComponentHealth::new(
                ComponentStatus::Unhealthy,
                Some("Model artifacts not loaded".to_string()),
                now,
            ),
            ArtifactStatus::Failed(reason) => ComponentHealth::new(
                ComponentStatus::Unhealthy,
                Some(format!("Model artifacts failed to load: {}", reason)),
                now,
            ),
        }
    }

    async fn predictor_health(&self, now: i64) -> ComponentHealth {
        let outcomes = &self.predictor;
        let timestamp = match outcomes.last_outcome_at.load(Ordering::Relaxed) {
            0 => now,
            at => at,
        };

        match outcomes.consecutive_failures.load(Ordering::Relaxed) {
            0 => ComponentHealth::new(ComponentStatus::Healthy, None, timestamp),
            failures => {
                let message = match outcomes.last_failure.read().await.as_deref() {
                    Some(detail) => {
                        format!("{} consecutive prediction failures: {}", failures, detail)
                    }
                    None => format!("{} consecutive prediction failures", failures),
                };
                ComponentHealth::new(ComponentStatus::Degraded, Some(message), timestamp)
            }
        }
    }

    /// Get health response
    pub async fn health(&self) -> HealthResponse {
        let now = chrono::Utc::now().timestamp();
        let mut report = HashMap::new();
        report.insert(components::ARTIFACTS.to_string(), self.artifacts_health(now));
        report.insert(
            components::PREDICTOR.to_string(),
            self.predictor_health(now).await,
        );
        HealthResponse::from_components(report)
    }

    /// Ready exactly when the slot holds a loaded bundle
    pub fn readiness(&self) -> ReadinessResponse {
        if self.artifacts.is_loaded() {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        } else {
            ReadinessResponse {
                ready: false,
                reason: self.artifacts_health(0).message,
            }
        }
    }
}
