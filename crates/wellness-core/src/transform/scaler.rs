//! Standardization with training-set statistics

use serde::Deserialize;
use tracing::warn;

use super::schema::{FeatureColumn, FEATURE_COUNT, FEATURE_ORDER};
use crate::error::{ArtifactLoadError, TransformError};

const ARTIFACT: &str = "scaler";

/// Narrow transform capability of a fitted numeric scaler
pub trait FeatureScaler: Send + Sync {
    /// Scale one value of the given column
    fn transform(&self, column: FeatureColumn, value: f64) -> Result<f64, TransformError>;
}

/// Mean and standard deviation of one column, fitted on the training set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Deserialize)]
struct ScalerArtifact {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// `(x - mean) / std` per column.
///
/// Every numeric column must have statistics. The department column may or
/// may not: when present the encoded department code is standardized as well,
/// otherwise it passes through unchanged.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    stats: [Option<ColumnStats>; FEATURE_COUNT],
}

impl StandardScaler {
    /// Build from `(column, stats)` pairs given in training column order
    pub fn new(columns: &[(FeatureColumn, ColumnStats)]) -> Result<Self, ArtifactLoadError> {
        let names: Vec<&str> = columns.iter().map(|(c, _)| c.name()).collect();
        check_column_order(&names)?;

        let mut stats = [None; FEATURE_COUNT];
        for (column, column_stats) in columns {
            if !column_stats.mean.is_finite() || !column_stats.std.is_finite() {
                return Err(ArtifactLoadError::invalid(
                    ARTIFACT,
                    format!("non-finite statistics for '{}'", column.name()),
                ));
            }
            if column_stats.std < 0.0 {
                return Err(ArtifactLoadError::invalid(
                    ARTIFACT,
                    format!("negative scale for '{}'", column.name()),
                ));
            }
            if column_stats.std == 0.0 {
                warn!(
                    feature = column.name(),
                    "Scaler has zero standard deviation; requests will be rejected"
                );
            }
            stats[column.index()] = Some(*column_stats);
        }

        Ok(Self { stats })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let artifact: ScalerArtifact = serde_json::from_slice(bytes).map_err(|source| {
            ArtifactLoadError::Malformed {
                name: ARTIFACT,
                source,
            }
        })?;

        let n = artifact.feature_names.len();
        if artifact.mean.len() != n || artifact.scale.len() != n {
            return Err(ArtifactLoadError::invalid(
                ARTIFACT,
                format!(
                    "{} feature names but {} means and {} scales",
                    n,
                    artifact.mean.len(),
                    artifact.scale.len()
                ),
            ));
        }

        let names: Vec<&str> = artifact.feature_names.iter().map(String::as_str).collect();
        check_column_order(&names)?;

        let columns: Vec<(FeatureColumn, ColumnStats)> = names
            .iter()
            .zip(artifact.mean.iter().zip(&artifact.scale))
            .filter_map(|(name, (mean, std))| {
                FeatureColumn::from_name(name).map(|column| {
                    (
                        column,
                        ColumnStats {
                            mean: *mean,
                            std: *std,
                        },
                    )
                })
            })
            .collect();

        Self::new(&columns)
    }

    pub fn stats(&self, column: FeatureColumn) -> Option<ColumnStats> {
        self.stats[column.index()]
    }

    pub fn scales_department(&self) -> bool {
        self.stats(FeatureColumn::Department).is_some()
    }
}

/// The scaler's columns must be the numeric columns, or all columns, in
/// training order. Anything else means the training frame changed shape.
fn check_column_order(names: &[&str]) -> Result<(), ArtifactLoadError> {
    let numeric: Vec<&str> = FeatureColumn::NUMERIC.iter().map(|c| c.name()).collect();
    let all: Vec<&str> = FEATURE_ORDER.iter().map(|c| c.name()).collect();

    if names == numeric.as_slice() || names == all.as_slice() {
        Ok(())
    } else {
        Err(ArtifactLoadError::invalid(
            ARTIFACT,
            format!(
                "columns {:?} do not match serving column order {:?}",
                names, all
            ),
        ))
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, column: FeatureColumn, value: f64) -> Result<f64, TransformError> {
        let stats = match self.stats(column) {
            Some(stats) => stats,
            None if column == FeatureColumn::Department => return Ok(value),
            None => {
                return Err(TransformError::Scaling {
                    feature: column.name(),
                    reason: "no training statistics".to_string(),
                })
            }
        };

        if stats.std == 0.0 {
            return Err(TransformError::Scaling {
                feature: column.name(),
                reason: "stored standard deviation is zero".to_string(),
            });
        }

        let scaled = (value - stats.mean) / stats.std;
        if !scaled.is_finite() {
            return Err(TransformError::Scaling {
                feature: column.name(),
                reason: format!("scaled value {} is not finite", scaled),
            });
        }
        Ok(scaled)
    }
}
