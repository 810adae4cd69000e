//! Curated recommendations per wellness label

use std::collections::HashMap;

use crate::error::ArtifactLoadError;
use crate::models::Resource;

const ARTIFACT: &str = "resources";

/// Label → ordered resources, exactly as curated
#[derive(Debug, Clone)]
pub struct ResourceLibrary {
    entries: HashMap<String, Vec<Resource>>,
}

impl ResourceLibrary {
    pub fn new(entries: HashMap<String, Vec<Resource>>) -> Result<Self, ArtifactLoadError> {
        if let Some((label, _)) = entries.iter().find(|(_, resources)| resources.is_empty()) {
            return Err(ArtifactLoadError::invalid(
                ARTIFACT,
                format!("entry for '{}' has no resources", label),
            ));
        }
        Ok(Self { entries })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let entries: HashMap<String, Vec<Resource>> = serde_json::from_slice(bytes)
            .map_err(|source| ArtifactLoadError::Malformed {
                name: ARTIFACT,
                source,
            })?;
        Self::new(entries)
    }

    /// Resources for a label. A label without an entry gets an empty list.
    pub fn resolve(&self, label: &str) -> Vec<Resource> {
        self.entries.get(label).cloned().unwrap_or_default()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
