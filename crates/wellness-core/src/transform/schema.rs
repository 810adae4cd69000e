//! Training-time column schema
//!
//! The classifier has no column names at inference time, so the position of
//! every feature is fixed here and nowhere else. The order must match the
//! column order of the frame the model was fitted on.

use crate::models::FeatureVector;

/// Number of columns the classifier consumes
pub const FEATURE_COUNT: usize = 5;

/// Number of numeric telemetry columns
pub const NUMERIC_COUNT: usize = 4;

/// A column of the training frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    FocusSessionLength,
    BreakFrequency,
    AfterHoursActivity,
    CommunicationSentiment,
    Department,
}

/// Training column order. Department is always last.
pub const FEATURE_ORDER: [FeatureColumn; FEATURE_COUNT] = [
    FeatureColumn::FocusSessionLength,
    FeatureColumn::BreakFrequency,
    FeatureColumn::AfterHoursActivity,
    FeatureColumn::CommunicationSentiment,
    FeatureColumn::Department,
];

/// Scaled numeric features, in [`FeatureColumn::NUMERIC`] order
pub type NumericFeatures = [f64; NUMERIC_COUNT];

impl FeatureColumn {
    /// The numeric columns, in training order
    pub const NUMERIC: [FeatureColumn; NUMERIC_COUNT] = [
        FeatureColumn::FocusSessionLength,
        FeatureColumn::BreakFrequency,
        FeatureColumn::AfterHoursActivity,
        FeatureColumn::CommunicationSentiment,
    ];

    /// Column name as it appears in the training frame and request JSON
    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::FocusSessionLength => "focus_session_length_minutes",
            FeatureColumn::BreakFrequency => "break_frequency_per_hour",
            FeatureColumn::AfterHoursActivity => "after_hours_activity_minutes",
            FeatureColumn::CommunicationSentiment => "communication_sentiment_score",
            FeatureColumn::Department => "department",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FEATURE_ORDER.iter().copied().find(|c| c.name() == name)
    }

    /// Position of this column in the feature vector
    pub fn index(self) -> usize {
        FEATURE_ORDER
            .iter()
            .position(|c| *c == self)
            .unwrap_or(FEATURE_COUNT - 1)
    }
}

/// Build a feature vector from scaled numeric values and the encoded
/// department.
pub fn assemble(scaled_numeric: &NumericFeatures, encoded_department: f64) -> FeatureVector {
    let mut values = [0.0; FEATURE_COUNT];
    for (column, value) in FeatureColumn::NUMERIC.iter().zip(scaled_numeric) {
        values[column.index()] = *value;
    }
    values[FeatureColumn::Department.index()] = encoded_department;
    FeatureVector::from_ordered(values)
}
