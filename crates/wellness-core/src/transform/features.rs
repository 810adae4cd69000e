//! Feature transformation for ML inference
//!
//! Reproduces the training-time preprocessing for a single request:
//! categorical encoding of the department, standardization of the numeric
//! telemetry, and assembly into the training column order.

use super::encoder::CategoryEncoder;
use super::scaler::FeatureScaler;
use super::schema::{self, FeatureColumn, NumericFeatures};
use crate::error::TransformError;
use crate::models::{FeatureVector, PredictionRequest};

/// Applies the fitted transforms of an artifact bundle to requests
pub struct FeatureTransformer<'a> {
    departments: &'a dyn CategoryEncoder,
    scaler: &'a dyn FeatureScaler,
}

impl<'a> FeatureTransformer<'a> {
    pub fn new(departments: &'a dyn CategoryEncoder, scaler: &'a dyn FeatureScaler) -> Self {
        Self {
            departments,
            scaler,
        }
    }

    /// Training code for a department. Categories unseen in training are
    /// rejected; there is no fallback code.
    pub fn encode_department(&self, value: &str) -> Result<i64, TransformError> {
        self.departments
            .encode(value)
            .ok_or_else(|| TransformError::UnseenCategory(value.to_string()))
    }

    /// Standardize the numeric telemetry of a request
    pub fn scale(&self, request: &PredictionRequest) -> Result<NumericFeatures, TransformError> {
        let mut scaled = [0.0; schema::NUMERIC_COUNT];
        for (slot, column) in scaled.iter_mut().zip(FeatureColumn::NUMERIC) {
            *slot = self.scaler.transform(column, request.numeric(column))?;
        }
        Ok(scaled)
    }

    pub fn assemble(
        &self,
        scaled_numeric: &NumericFeatures,
        encoded_department: f64,
    ) -> FeatureVector {
        schema::assemble(scaled_numeric, encoded_department)
    }

    /// Full request → feature vector transform
    pub fn transform(&self, request: &PredictionRequest) -> Result<FeatureVector, TransformError> {
        let code = self.encode_department(&request.department)?;
        let scaled = self.scale(request)?;
        let department = self
            .scaler
            .transform(FeatureColumn::Department, code as f64)?;
        Ok(self.assemble(&scaled, department))
    }
}
