//! Initial-conditions loading.
//!
//! Each worker reads only the slab range it owns, using the same
//! decomposition rule the rest of the pipeline uses. The loaded density is
//! negated: the upstream IC generators store the density with the opposite
//! sign convention, and the derivation pipeline works on `-δ_ic` throughout.
//! Displacement components are taken as stored.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use lag_core::errors::{ErrorInfo, LagError};
use lag_core::SlabLayout;
use lag_mesh::grid::RealGrid;
use lag_store::container::read_slab;

use crate::config::{IcFormat, RunConfig};

/// Filename of the raw-format linear density inside `icdir`.
pub const RAW_DENSITY_FILE: &str = "linear_density.f32";

/// Loads this worker's slab of the linear density field, negated.
pub fn load_density(config: &RunConfig, layout: SlabLayout) -> Result<RealGrid, LagError> {
    let mut slab = match config.ic_format {
        IcFormat::Container => read_slab(&config.icdir, "delta", layout)?,
        IcFormat::Raw => read_raw_slab(&config.icdir.join(RAW_DENSITY_FILE), layout)?,
    };
    for value in &mut slab {
        *value = -*value;
    }
    RealGrid::from_vec(layout, slab)
}

/// Loads this worker's slab of one displacement component (`dx`/`dy`/`dz`).
pub fn load_displacement(
    config: &RunConfig,
    layout: SlabLayout,
    name: &str,
) -> Result<RealGrid, LagError> {
    let slab = match config.ic_format {
        IcFormat::Container => read_slab(&config.icdir, name, layout)?,
        IcFormat::Raw => {
            return Err(LagError::Input(
                ErrorInfo::new(
                    "raw-displacements",
                    "raw-format initial conditions carry no displacement fields",
                )
                .with_context("component", name.to_string()),
            ))
        }
    };
    RealGrid::from_vec(layout, slab)
}

/// Reads one worker's slab from a raw little-endian `f32` mesh file.
fn read_raw_slab(path: &Path, layout: SlabLayout) -> Result<Vec<f32>, LagError> {
    if !path.exists() {
        return Err(LagError::missing_input(path.display().to_string()));
    }
    let n = layout.nmesh;
    let expected_bytes = (n * n * n * 4) as u64;
    let mut file = File::open(path).map_err(|err| input_error("raw-open", path, err))?;
    let actual = file
        .metadata()
        .map_err(|err| input_error("raw-stat", path, err))?
        .len();
    if actual != expected_bytes {
        return Err(LagError::Shape(
            ErrorInfo::new("raw-size", "raw mesh file length does not match nmesh³")
                .with_context("path", path.display().to_string())
                .with_context("expected_bytes", expected_bytes.to_string())
                .with_context("actual_bytes", actual.to_string()),
        ));
    }

    let offset = (layout.start * n * n * 4) as u64;
    let count = layout.local_len() * n * n;
    file.seek(SeekFrom::Start(offset))
        .map_err(|err| input_error("raw-seek", path, err))?;
    let mut bytes = vec![0u8; count * 4];
    file.read_exact(&mut bytes)
        .map_err(|err| input_error("raw-read", path, err))?;

    let mut slab = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(4) {
        slab.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(slab)
}

/// Writes a full mesh as a raw little-endian `f32` file (the `raw` IC
/// format). Mostly useful for preparing inputs and tests.
pub fn write_raw_mesh(path: &Path, data: &[f32]) -> Result<(), LagError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| input_error("raw-mkdir", path, err))?;
    }
    let mut bytes = Vec::with_capacity(data.len() * 4);
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    std::fs::write(path, bytes).map_err(|err| input_error("raw-write", path, err))
}

/// Reads a two-column (wavenumber, power) text table. Blank lines and `#`
/// comments are skipped.
pub fn read_power_table(path: &Path) -> Result<(Vec<f64>, Vec<f64>), LagError> {
    if !path.exists() {
        return Err(LagError::missing_input(path.display().to_string()));
    }
    let file = File::open(path).map_err(|err| input_error("table-open", path, err))?;
    let mut k = Vec::new();
    let mut power = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| input_error("table-read", path, err))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut columns = trimmed.split_whitespace();
        let (Some(k_text), Some(p_text)) = (columns.next(), columns.next()) else {
            return Err(table_error(path, line_no, "expected two columns"));
        };
        let k_value: f64 = k_text
            .parse()
            .map_err(|_| table_error(path, line_no, "unparseable wavenumber"))?;
        let p_value: f64 = p_text
            .parse()
            .map_err(|_| table_error(path, line_no, "unparseable power"))?;
        k.push(k_value);
        power.push(p_value);
    }
    if k.is_empty() {
        return Err(table_error(path, 0, "table holds no rows"));
    }
    Ok((k, power))
}

fn input_error(code: &str, path: &Path, err: impl std::fmt::Display) -> LagError {
    LagError::Input(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

fn table_error(path: &Path, line_no: usize, message: &str) -> LagError {
    LagError::Input(
        ErrorInfo::new("table-parse", message)
            .with_context("path", path.display().to_string())
            .with_context("line", (line_no + 1).to_string()),
    )
}

/// Path of the raw density file inside an IC directory.
pub fn raw_density_path(icdir: &Path) -> PathBuf {
    icdir.join(RAW_DENSITY_FILE)
}
