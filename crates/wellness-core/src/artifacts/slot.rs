//! Process-wide artifact holder with a one-shot lifecycle
//!
//! `Uninitialized → Loaded | Failed`. The slot is written at most once and
//! is read-only afterwards, so request handlers share it without locking.

use std::sync::{Arc, OnceLock};
use tracing::warn;

use super::ArtifactBundle;
use crate::error::ArtifactLoadError;

/// Observable state of the slot
#[derive(Debug, Clone, Copy)]
pub enum ArtifactStatus<'a> {
    Uninitialized,
    Loaded(&'a ArtifactBundle),
    Failed(&'a str),
}

#[derive(Debug, Default)]
pub struct ArtifactSlot {
    cell: OnceLock<Result<Arc<ArtifactBundle>, String>>,
}

impl ArtifactSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// A slot that is already loaded with `bundle`
    pub fn loaded(bundle: ArtifactBundle) -> Self {
        let slot = Self::new();
        let _ = slot.cell.set(Ok(Arc::new(bundle)));
        slot
    }

    /// Record the outcome of the startup load. Only the first call has any
    /// effect; later calls leave the slot untouched.
    pub fn initialize(
        &self,
        result: Result<ArtifactBundle, ArtifactLoadError>,
    ) -> Result<Arc<ArtifactBundle>, ArtifactLoadError> {
        match result {
            Ok(bundle) => {
                let bundle = Arc::new(bundle);
                if self.cell.set(Ok(bundle.clone())).is_err() {
                    warn!("Ignoring second artifact initialization");
                    return Err(ArtifactLoadError::AlreadyInitialized);
                }
                Ok(bundle)
            }
            Err(err) => {
                if self.cell.set(Err(err.to_string())).is_err() {
                    warn!("Ignoring second artifact initialization");
                }
                Err(err)
            }
        }
    }

    pub fn status(&self) -> ArtifactStatus<'_> {
        match self.cell.get() {
            None => ArtifactStatus::Uninitialized,
            Some(Ok(bundle)) => ArtifactStatus::Loaded(bundle),
            Some(Err(reason)) => ArtifactStatus::Failed(reason),
        }
    }

    pub fn bundle(&self) -> Option<&Arc<ArtifactBundle>> {
        self.cell.get().and_then(|state| state.as_ref().ok())
    }

    pub fn is_loaded(&self) -> bool {
        self.bundle().is_some()
    }
}
