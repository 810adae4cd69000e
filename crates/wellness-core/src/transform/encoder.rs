//! Categorical encoding tables
//!
//! A fitted encoder is an ordered list of classes; the code of a class is its
//! position in that list. Both the department encoder and the wellness label
//! encoder use this form.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ArtifactLoadError;

/// Narrow encode/decode capability of a fitted categorical encoder
pub trait CategoryEncoder: Send + Sync {
    /// Integer code for a category, or `None` for a category never seen in training
    fn encode(&self, value: &str) -> Option<i64>;

    /// Category for an integer code, or `None` when out of range
    fn decode(&self, code: i64) -> Option<&str>;

    /// All classes in code order
    fn classes(&self) -> &[String];
}

#[derive(Debug, Deserialize)]
struct EncoderArtifact {
    classes: Vec<String>,
}

/// Encoding table backed by the fitted class list
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Build from a class list, rejecting empty or duplicated classes
    pub fn from_classes(
        name: &'static str,
        classes: Vec<String>,
    ) -> Result<Self, ArtifactLoadError> {
        if classes.is_empty() {
            return Err(ArtifactLoadError::invalid(name, "encoder has no classes"));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code as i64).is_some() {
                return Err(ArtifactLoadError::invalid(
                    name,
                    format!("duplicate class '{}'", class),
                ));
            }
        }

        Ok(Self { classes, codes })
    }

    pub fn from_json(name: &'static str, bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let artifact: EncoderArtifact = serde_json::from_slice(bytes)
            .map_err(|source| ArtifactLoadError::Malformed { name, source })?;
        Self::from_classes(name, artifact.classes)
    }
}

impl CategoryEncoder for LabelEncoder {
    fn encode(&self, value: &str) -> Option<i64> {
        self.codes.get(value).copied()
    }

    fn decode(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}
