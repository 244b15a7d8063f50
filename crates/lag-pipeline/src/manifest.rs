use std::fs;
use std::path::{Path, PathBuf};

use lag_core::errors::ErrorInfo;
use lag_core::{LagError, RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::controller::RunSummary;

/// Structured manifest describing a completed field-derivation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version of the manifest payload.
    pub schema: SchemaVersion,
    /// Configuration used for the run.
    pub config: RunConfig,
    /// Provenance (config hash, worker count, creation timestamp, tools).
    pub provenance: RunProvenance,
    /// Dataset names persisted during the run, in write order.
    pub datasets: Vec<String>,
    /// Container path, when the run kept the shared container.
    pub container: Option<PathBuf>,
    /// Flattened per-field files, when flattening was requested.
    pub flattened: Vec<PathBuf>,
    /// Summary statistics of the run.
    pub summary: RunSummary,
}

impl RunManifest {
    /// Assembles a manifest from a finished run.
    pub fn from_run(config: &RunConfig, summary: &RunSummary, provenance: RunProvenance) -> Self {
        Self {
            schema: SchemaVersion::default(),
            config: config.clone(),
            provenance,
            datasets: summary.datasets.clone(),
            container: summary.container.clone(),
            flattened: summary.flattened.clone(),
            summary: summary.clone(),
        }
    }

    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), LagError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                LagError::Store(
                    ErrorInfo::new("manifest-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            LagError::Store(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            LagError::Store(
                ErrorInfo::new("manifest-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, LagError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            LagError::Store(
                ErrorInfo::new("manifest-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            LagError::Store(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
