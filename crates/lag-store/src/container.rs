//! Shared field container with collective, slab-addressed writes.
//!
//! One container exists per `(basename, nmesh)` run and holds every
//! persisted field keyed by name. Writes are collective: each worker
//! contributes exactly the slab range it owns, using the same decomposition
//! rule used to read its inputs, and the root assembles and persists the
//! result. All multi-worker mutation of the container goes through this
//! path; there is no ad hoc write route.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lag_core::errors::{ErrorInfo, LagError};
use lag_core::{SlabLayout, SchemaVersion, WorkerCtx};
use lag_mesh::grid::RealGrid;
use serde::{Deserialize, Serialize};

/// On-disk payload of a field container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// Schema version of the container format.
    pub schema: SchemaVersion,
    /// Global mesh size of every stored field.
    pub nmesh: usize,
    /// Fully assembled `nmesh³` arrays keyed by field name.
    pub fields: BTreeMap<String, Vec<f32>>,
}

impl Container {
    /// Names of the stored datasets, in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// The assembled array for `name`, if present.
    pub fn field(&self, name: &str) -> Option<&[f32]> {
        self.fields.get(name).map(Vec::as_slice)
    }
}

/// Collective writer accumulating one run's fields before persistence.
pub struct FieldStore {
    ctx: WorkerCtx,
    path: PathBuf,
    nmesh: usize,
    fields: BTreeMap<String, Vec<f32>>,
}

impl FieldStore {
    /// Creates a store that will persist to `path` on [`FieldStore::close`].
    /// Every worker constructs its own instance with the identical path.
    pub fn create(ctx: &WorkerCtx, path: impl Into<PathBuf>, nmesh: usize) -> Self {
        Self {
            ctx: ctx.clone(),
            path: path.into(),
            nmesh,
            fields: BTreeMap::new(),
        }
    }

    /// The container path this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Collectively writes one named field. Each worker passes its own slab;
    /// the slab layout must match this worker's decomposition of the store's
    /// mesh. Re-writing a name replaces the dataset.
    pub fn write(&mut self, name: &str, grid: &RealGrid) -> Result<(), LagError> {
        let expected = SlabLayout::for_worker(self.ctx.rank(), self.ctx.size(), self.nmesh);
        if grid.layout() != expected {
            return Err(LagError::Decomposition(
                ErrorInfo::new(
                    "store-slab-mismatch",
                    "field slab does not match this worker's store decomposition",
                )
                .with_context("field", name.to_string())
                .with_context("expected", format!("{}..{}", expected.start, expected.end))
                .with_context(
                    "actual",
                    format!("{}..{}", grid.layout().start, grid.layout().end),
                ),
            ));
        }

        let mut outgoing: Vec<Vec<f32>> = Vec::with_capacity(self.ctx.size());
        for dest in 0..self.ctx.size() {
            if dest == 0 {
                outgoing.push(grid.data().to_vec());
            } else {
                outgoing.push(Vec::new());
            }
        }
        let received = self.ctx.exchange(outgoing);
        if self.ctx.is_root() {
            let mut full = Vec::with_capacity(self.nmesh * self.nmesh * self.nmesh);
            for slab in received {
                full.extend_from_slice(&slab);
            }
            self.fields.insert(name.to_string(), full);
        }
        Ok(())
    }

    /// Collectively closes the store; the root persists the container.
    pub fn close(self) -> Result<(), LagError> {
        if self.ctx.is_root() {
            let payload = Container {
                schema: SchemaVersion::default(),
                nmesh: self.nmesh,
                fields: self.fields,
            };
            write_container(&self.path, &payload)?;
        }
        self.ctx.barrier();
        Ok(())
    }
}

/// Serializes a container to disk.
pub fn write_container(path: &Path, container: &Container) -> Result<(), LagError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| store_error("container-mkdir", path, err))?;
    }
    let bytes = bincode::serialize(container)
        .map_err(|err| store_error("container-serialize", path, err))?;
    fs::write(path, bytes).map_err(|err| store_error("container-write", path, err))
}

/// Loads a container from disk.
pub fn open_container(path: &Path) -> Result<Container, LagError> {
    if !path.exists() {
        return Err(LagError::missing_input(path.display().to_string()));
    }
    let bytes = fs::read(path).map_err(|err| store_error("container-read", path, err))?;
    bincode::deserialize(&bytes).map_err(|err| store_error("container-parse", path, err))
}

/// Reads one worker's slab of a named dataset from a container on disk.
pub fn read_slab(path: &Path, name: &str, layout: SlabLayout) -> Result<Vec<f32>, LagError> {
    let container = open_container(path)?;
    if container.nmesh != layout.nmesh {
        return Err(LagError::Shape(
            ErrorInfo::new("container-mesh", "container mesh size does not match the request")
                .with_context("container", container.nmesh.to_string())
                .with_context("requested", layout.nmesh.to_string()),
        ));
    }
    let field = container
        .field(name)
        .ok_or_else(|| LagError::missing_input(format!("{}:{name}", path.display())))?;
    let n = layout.nmesh;
    Ok(field[layout.start * n * n..layout.end * n * n].to_vec())
}

fn store_error(code: &str, path: &Path, err: impl std::fmt::Display) -> LagError {
    LagError::Store(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}
