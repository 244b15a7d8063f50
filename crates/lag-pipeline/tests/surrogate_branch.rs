use std::fs;
use std::path::Path;

use lag_core::worker::WorkerCtx;
use lag_core::SlabLayout;
use lag_mesh::grid::RealGrid;
use lag_pipeline::config::RunConfig;
use lag_pipeline::controller::make_lag_fields;
use lag_store::container::{open_container, FieldStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

const NMESH: usize = 8;
const NCELLS: usize = NMESH * NMESH * NMESH;

fn variance(data: &[f32]) -> f64 {
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64;
    data.iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / data.len() as f64
}

fn write_ic_container(path: &Path, seed: u64) -> Vec<f32> {
    let ctx = WorkerCtx::solo();
    let layout = SlabLayout::for_worker(0, 1, NMESH);
    let mut rng = StdRng::seed_from_u64(seed);
    let delta: Vec<f32> = (0..NCELLS).map(|_| rng.gen_range(-0.5f32..0.5)).collect();

    let mut store = FieldStore::create(&ctx, path, NMESH);
    store
        .write("delta", &RealGrid::from_vec(layout, delta.clone()).unwrap())
        .unwrap();
    for name in ["dx", "dy", "dz"] {
        let psi: Vec<f32> = (0..NCELLS).map(|_| rng.gen_range(-2.0f32..2.0)).collect();
        store
            .write(name, &RealGrid::from_vec(layout, psi).unwrap())
            .unwrap();
    }
    store.close().unwrap();
    delta
}

fn surrogate_config(ics: &Path, out: &Path) -> RunConfig {
    let yaml = format!(
        "nmesh_in: {NMESH}\n\
         lbox: 100.0\n\
         ic_format: container\n\
         icdir: {}\n\
         outdir: {}\n\
         compute_cv_surrogate: true\n",
        ics.display(),
        out.display(),
    );
    RunConfig::from_yaml_str(&yaml).unwrap()
}

#[test]
fn surrogate_branch_persists_filtered_fields() {
    let dir = tempdir().unwrap();
    let ics = dir.path().join("ics.lagc");
    let raw_delta = write_ic_container(&ics, 5);
    let config = surrogate_config(&ics, &dir.path().join("out"));
    let ctx = WorkerCtx::solo();

    let (fields, summary) = make_lag_fields(&ctx, &config, true).unwrap();

    assert_eq!(
        summary.datasets,
        vec![
            "delta_filt",
            "dx_filt",
            "dy_filt",
            "dz_filt",
            "deltasq",
            "delta",
            "tidesq",
            "nablasq"
        ]
    );

    let container = open_container(summary.container.as_ref().unwrap()).unwrap();
    // The working density of the surrogate run is the filtered density.
    assert_eq!(
        container.field("delta").unwrap(),
        container.field("delta_filt").unwrap()
    );
    assert_eq!(container.field("delta").unwrap(), fields.delta.data());

    // Smoothing strictly reduces small-scale power for a generic input.
    assert!(variance(fields.delta.data()) < variance(&raw_delta));
    for name in ["dx_filt", "dy_filt", "dz_filt"] {
        for value in container.field(name).unwrap() {
            assert!(value.is_finite());
        }
    }
}

#[test]
fn surrogate_container_uses_the_filt_basename() {
    let dir = tempdir().unwrap();
    let ics = dir.path().join("ics.lagc");
    write_ic_container(&ics, 6);
    let config = surrogate_config(&ics, &dir.path().join("out"));
    let ctx = WorkerCtx::solo();

    let (_fields, summary) = make_lag_fields(&ctx, &config, true).unwrap();
    let path = summary.container.unwrap();
    assert!(path.to_string_lossy().ends_with("lag_fields_filt_8.lagc"));
}

#[test]
fn missing_displacements_abort_the_surrogate_run() {
    let dir = tempdir().unwrap();
    let ics = dir.path().join("ics.lagc");
    // Container with only the density: the surrogate branch needs dx/dy/dz.
    let ctx = WorkerCtx::solo();
    let layout = SlabLayout::for_worker(0, 1, NMESH);
    let mut store = FieldStore::create(&ctx, &ics, NMESH);
    store
        .write("delta", &RealGrid::zeros(layout))
        .unwrap();
    store.close().unwrap();

    let config = surrogate_config(&ics, &dir.path().join("out"));
    let err = make_lag_fields(&ctx, &config, true).unwrap_err();
    assert_eq!(err.info().code, "missing-input");
}

#[test]
fn scale_dependent_growth_rescales_fluctuations() {
    let dir = tempdir().unwrap();
    let ics = dir.path().join("ics.lagc");
    write_ic_container(&ics, 7);

    let table = dir.path().join("p_lin.txt");
    let mut rows = String::from("# k P(k)\n");
    for i in 1..32 {
        let k = 0.02 * i as f64;
        rows.push_str(&format!("{k} {}\n", 1000.0 / k));
    }
    fs::write(&table, rows).unwrap();

    let yaml = format!(
        "nmesh_in: {NMESH}\n\
         lbox: 100.0\n\
         ic_format: container\n\
         icdir: {}\n\
         outdir: {}\n\
         scale_dependent_growth: true\n\
         z_ic: 99.0\n\
         z_target: 0.0\n\
         p_lin_ic_file: {}\n",
        ics.display(),
        dir.path().join("out").display(),
        table.display(),
    );
    let config = RunConfig::from_yaml_str(&yaml).unwrap();
    let ctx = WorkerCtx::solo();

    let (fields, summary) = make_lag_fields(&ctx, &config, false).unwrap();
    // Growth from z=99 to z=0 amplifies fluctuations by a large factor.
    assert!(variance(fields.delta.data()) > 100.0 * 0.25 / 12.0);
    for value in fields.delta.data() {
        assert!(value.is_finite());
    }
    let deltasq_mean: f64 = fields
        .deltasq
        .data()
        .iter()
        .map(|&v| v as f64)
        .sum::<f64>()
        / NCELLS as f64;
    assert!(deltasq_mean.abs() < 1e-3 * summary.deltasq_mean.abs().max(1.0));
}
