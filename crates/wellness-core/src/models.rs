//! Core data models for the wellness inference service

use serde::{Deserialize, Serialize};

use crate::transform::schema::{FeatureColumn, FEATURE_COUNT};

/// Raw behavioral telemetry for one employee, as received at the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub focus_session_length_minutes: f64,
    pub break_frequency_per_hour: f64,
    pub after_hours_activity_minutes: f64,
    pub communication_sentiment_score: f64,
    pub department: String,
}

impl PredictionRequest {
    /// Check value ranges. Shape and types are already enforced by serde.
    pub fn validate(&self) -> Result<(), String> {
        for column in FeatureColumn::NUMERIC {
            let value = self.numeric(column);
            if !value.is_finite() {
                return Err(format!("{} must be a finite number", column.name()));
            }
            if value < 0.0 {
                return Err(format!(
                    "{} must be non-negative, got {}",
                    column.name(),
                    value
                ));
            }
        }

        let sentiment = self.communication_sentiment_score;
        if !(0.0..=1.0).contains(&sentiment) {
            return Err(format!(
                "communication_sentiment_score must be within [0, 1], got {}",
                sentiment
            ));
        }

        Ok(())
    }

    /// Numeric value for a column. The department column has no numeric
    /// value before encoding and yields NaN.
    pub fn numeric(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::FocusSessionLength => self.focus_session_length_minutes,
            FeatureColumn::BreakFrequency => self.break_frequency_per_hour,
            FeatureColumn::AfterHoursActivity => self.after_hours_activity_minutes,
            FeatureColumn::CommunicationSentiment => self.communication_sentiment_score,
            FeatureColumn::Department => f64::NAN,
        }
    }
}

/// Classifier input in training column order.
///
/// Only [`crate::transform::schema::assemble`] builds these, so the column
/// order cannot be re-derived anywhere else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub(crate) fn from_ordered(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, column: FeatureColumn) -> f64 {
        self.0[column.index()]
    }
}

/// A curated recommendation entry, verbatim from the resource library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub description: String,
    pub link: String,
}

/// Prediction result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub wellness_label: String,
    pub recommended_resources: Vec<Resource>,
}
