//! The end-to-end field-derivation sequence.
//!
//! Load → optional scale-dependent growth rescale → optional surrogate
//! smoothing branch → density-squared (mean-subtracted) → one forward
//! transform of the density → tidal-squared (mean-subtracted) and Laplacian
//! from that single transform → persist → optional flatten. The four derived
//! fields are also returned in memory for immediate reuse.
//!
//! The working set of `nmesh³/worker_count`-sized arrays is the binding
//! resource; each large intermediate is owned by exactly one step and
//! dropped as soon as no later step needs it.

use std::path::PathBuf;
use std::time::Instant;

use lag_core::errors::{ErrorInfo, LagError};
use lag_core::WorkerCtx;
use lag_kernels::curvature::nablasq;
use lag_kernels::filter::{default_cutoff, gaussian_filter};
use lag_kernels::growth::GrowthSolver;
use lag_kernels::tidal::tidesq;
use lag_kernels::transfer::{apply_transfer, TransferTable};
use lag_mesh::grid::RealGrid;
use lag_mesh::reduce::subtract_global_mean;
use lag_mesh::transform::SpectralTransform;
use lag_mesh::wavenumbers::WavenumberGrid;
use lag_store::container::FieldStore;
use lag_store::flatten::flatten;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::loader;

/// The derived basis fields of one run, kept in memory for downstream use.
#[derive(Debug)]
pub struct LagFieldSet {
    /// Working linear density (filtered in the surrogate branch).
    pub delta: RealGrid,
    /// Mean-subtracted squared density.
    pub deltasq: RealGrid,
    /// Mean-subtracted squared tidal field.
    pub tidesq: RealGrid,
    /// Laplacian (curvature) field.
    pub nablasq: RealGrid,
}

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Mesh resolution the fields were derived at.
    pub nmesh: usize,
    /// Number of workers the run was decomposed across.
    pub worker_count: usize,
    /// Global mean removed from `deltasq`.
    pub deltasq_mean: f64,
    /// Global mean removed from `tidesq`.
    pub tidesq_mean: f64,
    /// Dataset names persisted to the container, in write order.
    pub datasets: Vec<String>,
    /// Container path, when the run persisted and did not flatten.
    pub container: Option<PathBuf>,
    /// Flattened per-field files (root worker only).
    pub flattened: Vec<PathBuf>,
    /// Wall-clock duration of the run in seconds.
    pub elapsed_seconds: f64,
}

/// Derives the Lagrangian bias basis fields for one configuration.
///
/// Collective: every worker of the group must call this with the identical
/// configuration. With `save_to_disk` unset, nothing is persisted and the
/// fields are only returned in memory.
pub fn make_lag_fields(
    ctx: &WorkerCtx,
    config: &RunConfig,
    save_to_disk: bool,
) -> Result<(LagFieldSet, RunSummary), LagError> {
    config.validate()?;
    let started = Instant::now();
    let nmesh = config.nmesh_in;

    let transform = SpectralTransform::new(ctx, nmesh)?;
    let kgrid = WavenumberGrid::new(config.lbox, transform.freq_layout());
    let layout = transform.real_layout();

    let mut delta = loader::load_density(config, layout)?;

    if config.scale_dependent_growth {
        let table = build_growth_transfer(config)?;
        delta = apply_transfer(&transform, &kgrid, &delta, &table)?;
    }

    let mut store = if save_to_disk {
        Some(FieldStore::create(ctx, config.container_path(), nmesh))
    } else {
        None
    };
    let mut datasets: Vec<String> = Vec::new();

    if config.compute_cv_surrogate {
        let kcut = config
            .surrogate_gaussian_cutoff
            .unwrap_or_else(|| default_cutoff(nmesh, config.lbox));
        delta = gaussian_filter(&transform, &kgrid, &delta, kcut)?;
        persist(&mut store, &mut datasets, "delta_filt", &delta)?;
        for (source, dataset) in [("dx", "dx_filt"), ("dy", "dy_filt"), ("dz", "dz_filt")] {
            // One displacement component resident at a time; the unfiltered
            // slab is released before the next component loads.
            let psi = loader::load_displacement(config, layout, source)?;
            let filtered = gaussian_filter(&transform, &kgrid, &psi, kcut)?;
            drop(psi);
            persist(&mut store, &mut datasets, dataset, &filtered)?;
        }
    }

    // deltasq is local in real space: square, then subtract the global mean
    // so every worker removes the identical value.
    let mut deltasq = RealGrid::zeros(layout);
    for (out, value) in deltasq.data_mut().iter_mut().zip(delta.data()) {
        *out = value * value;
    }
    let deltasq_mean = subtract_global_mean(ctx, &mut deltasq);
    persist(&mut store, &mut datasets, "deltasq", &deltasq)?;
    persist(&mut store, &mut datasets, "delta", &delta)?;

    // One forward transform feeds both remaining kernels.
    let delta_k = transform.forward(&delta, true)?;

    let mut tidesq_field = tidesq(&transform, &kgrid, &delta_k)?;
    let tidesq_mean = subtract_global_mean(ctx, &mut tidesq_field);
    persist(&mut store, &mut datasets, "tidesq", &tidesq_field)?;

    let nablasq_field = nablasq(&transform, &kgrid, &delta_k)?;
    drop(delta_k);
    persist(&mut store, &mut datasets, "nablasq", &nablasq_field)?;

    let mut container = None;
    let mut flattened = Vec::new();
    if let Some(store) = store.take() {
        let path = store.path().to_path_buf();
        store.close()?;
        if config.flatten_outputs {
            flattened = flatten(ctx, &path)?;
        } else {
            container = Some(path);
        }
    }

    let summary = RunSummary {
        nmesh,
        worker_count: ctx.size(),
        deltasq_mean,
        tidesq_mean,
        datasets,
        container,
        flattened,
        elapsed_seconds: started.elapsed().as_secs_f64(),
    };
    let fields = LagFieldSet {
        delta,
        deltasq,
        tidesq: tidesq_field,
        nablasq: nablasq_field,
    };
    Ok((fields, summary))
}

/// Writes one dataset through the store's collective path. The dataset name
/// is bound to its source field here and nowhere else, so a stored name can
/// never drift from the field it labels.
fn persist(
    store: &mut Option<FieldStore>,
    datasets: &mut Vec<String>,
    name: &str,
    field: &RealGrid,
) -> Result<(), LagError> {
    if let Some(store) = store {
        store.write(name, field)?;
        datasets.push(name.to_string());
    }
    Ok(())
}

/// Builds the radial transfer table for scale-dependent growth: the target
/// spectrum over the IC spectrum, with the target either tabulated or
/// produced by the growth solver's scale-independent rescaling.
fn build_growth_transfer(config: &RunConfig) -> Result<TransferTable, LagError> {
    let ic_table = config.p_lin_ic_file.as_ref().ok_or_else(|| {
        LagError::Config(ErrorInfo::new(
            "p-lin-ic",
            "scale_dependent_growth requires p_lin_ic_file",
        ))
    })?;
    let (k, p_init) = loader::read_power_table(ic_table)?;
    let p_target = match &config.p_lin_target_file {
        Some(path) => {
            let (_k_target, p_target) = loader::read_power_table(path)?;
            p_target
        }
        None => {
            let solver = GrowthSolver::new(config.cosmology.clone())?;
            let z_target = config.z_target.ok_or_else(|| {
                LagError::Config(ErrorInfo::new(
                    "z-target",
                    "scale_dependent_growth requires z_target or p_lin_target_file",
                ))
            })?;
            solver.rescale_spectrum(&p_init, config.z_ic, z_target)
        }
    };
    TransferTable::from_spectra(&k, &p_target, &p_init)
}
