//! Flattening a shared container into self-contained per-field arrays.
//!
//! The container's slab-addressable layout serves the distributed writers;
//! later single-process consumers want one flat array per field. After all
//! fields of a run are written, the root reads each dataset back in full,
//! writes it out as its own file, and discards the intermediate container.

use std::fs;
use std::path::{Path, PathBuf};

use lag_core::errors::{ErrorInfo, LagError};
use lag_core::{SchemaVersion, WorkerCtx};
use serde::{Deserialize, Serialize};

use crate::container::open_container;

/// One flattened field as persisted for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatField {
    /// Schema version of the flat-field format.
    pub schema: SchemaVersion,
    /// Global mesh size of the array.
    pub nmesh: usize,
    /// Dataset name the array was flattened from.
    pub name: String,
    /// Row-major `nmesh³` values.
    pub data: Vec<f32>,
}

/// Path of the flattened file for `field`, derived from the container path.
pub fn flat_path(container: &Path, field: &str) -> PathBuf {
    let stem = container
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("fields");
    container.with_file_name(format!("{stem}_{field}.lagf"))
}

/// Collectively flattens a closed container: the root rewrites each dataset
/// as one per-field file and removes the container; other workers only
/// synchronize. Returns the flattened paths on the root, an empty list
/// elsewhere.
pub fn flatten(ctx: &WorkerCtx, container_path: &Path) -> Result<Vec<PathBuf>, LagError> {
    let mut written = Vec::new();
    if ctx.is_root() {
        let container = open_container(container_path)?;
        for (name, data) in &container.fields {
            let flat = FlatField {
                schema: SchemaVersion::default(),
                nmesh: container.nmesh,
                name: name.clone(),
                data: data.clone(),
            };
            let path = flat_path(container_path, name);
            let bytes = bincode::serialize(&flat).map_err(|err| {
                LagError::Store(
                    ErrorInfo::new("flat-serialize", err.to_string())
                        .with_context("path", path.display().to_string()),
                )
            })?;
            fs::write(&path, bytes).map_err(|err| {
                LagError::Store(
                    ErrorInfo::new("flat-write", err.to_string())
                        .with_context("path", path.display().to_string()),
                )
            })?;
            written.push(path);
        }
        fs::remove_file(container_path).map_err(|err| {
            LagError::Store(
                ErrorInfo::new("container-remove", err.to_string())
                    .with_context("path", container_path.display().to_string()),
            )
        })?;
    }
    ctx.barrier();
    Ok(written)
}

/// Loads a flattened field file.
pub fn read_flat(path: &Path) -> Result<FlatField, LagError> {
    if !path.exists() {
        return Err(LagError::missing_input(path.display().to_string()));
    }
    let bytes = fs::read(path).map_err(|err| {
        LagError::Store(
            ErrorInfo::new("flat-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    bincode::deserialize(&bytes).map_err(|err| {
        LagError::Store(
            ErrorInfo::new("flat-parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}
