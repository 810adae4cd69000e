//! Optional artifact manifest with SHA-256 checksums
//!
//! The training pipeline may write `manifest.json` next to the artifacts:
//!
//! ```json
//! { "version": "2024-05-01", "checksums": { "scaler.json": "9f86d0..." } }
//! ```
//!
//! Every listed file must hash to the recorded value before anything is
//! loaded.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::ArtifactLoadError;

pub const MANIFEST_FILE: &str = "manifest.json";

const ARTIFACT: &str = "manifest";

/// Version reported when no manifest is present
pub const UNVERSIONED: &str = "unversioned";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

impl Manifest {
    /// Read the manifest from an artifact directory, if there is one
    pub fn read(dir: &Path) -> Result<Option<Self>, ArtifactLoadError> {
        let path = dir.join(MANIFEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ArtifactLoadError::Unreadable {
                    name: ARTIFACT,
                    path,
                    source,
                })
            }
        };

        let manifest: Manifest = serde_json::from_slice(&bytes).map_err(|source| {
            ArtifactLoadError::Malformed {
                name: ARTIFACT,
                source,
            }
        })?;
        Ok(Some(manifest))
    }

    /// Check every listed file against its recorded checksum
    pub fn verify(&self, dir: &Path) -> Result<(), ArtifactLoadError> {
        for (file, expected) in &self.checksums {
            if file.contains(|c: char| c == '/' || c == '\\') || file == ".." || file == "." {
                return Err(ArtifactLoadError::invalid(
                    ARTIFACT,
                    format!("'{}' is not a file name inside the artifact directory", file),
                ));
            }

            let path = dir.join(file);
            let bytes = fs::read(&path).map_err(|source| ArtifactLoadError::Unreadable {
                name: ARTIFACT,
                path: path.clone(),
                source,
            })?;

            // Hand-written manifests may use upper-case hex
            let actual = compute_checksum(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(ArtifactLoadError::ChecksumMismatch {
                    file: file.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!(file = %file, checksum = %actual, "Artifact checksum validated");
        }
        Ok(())
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(UNVERSIONED)
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
