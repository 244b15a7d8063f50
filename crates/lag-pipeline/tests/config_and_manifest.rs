use lag_core::{RunProvenance, SchemaVersion};
use lag_pipeline::config::{IcFormat, RunConfig};
use lag_pipeline::controller::RunSummary;
use lag_pipeline::manifest::RunManifest;
use tempfile::tempdir;

fn minimal_yaml() -> &'static str {
    "nmesh_in: 8\nlbox: 100.0\nicdir: /tmp/ics\n"
}

#[test]
fn minimal_config_fills_defaults() {
    let config = RunConfig::from_yaml_str(minimal_yaml()).unwrap();
    assert_eq!(config.nmesh_in, 8);
    assert_eq!(config.nmesh_out(), 8);
    assert_eq!(config.z_ic, 99.0);
    assert_eq!(config.z_target, None);
    assert!(!config.rsd);
    assert!(!config.compute_cv_surrogate);
    assert!(!config.scale_dependent_growth);
    assert_eq!(config.ic_format, IcFormat::Container);
    assert!(config.surrogate_gaussian_cutoff.is_none());
    assert!(!config.flatten_outputs);
    config.validate().unwrap();
}

#[test]
fn full_config_round_trips_through_yaml() {
    let yaml = "\
nmesh_in: 16
nmesh_out: 32
lbox: 250.0
z_ic: 49.0
z_target: 1.0
rsd: true
compute_cv_surrogate: true
surrogate_gaussian_cutoff: 0.4
scale_dependent_growth: true
p_lin_ic_file: /tmp/p_lin.txt
cosmology:
  omega_m: 0.3
  h: 0.7
ic_format: container
icdir: /tmp/ics.lagc
outdir: /tmp/out
flatten_outputs: true
";
    let config = RunConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.nmesh_out(), 32);
    assert_eq!(config.z_target, Some(1.0));
    assert!(config.rsd);
    assert_eq!(config.surrogate_gaussian_cutoff, Some(0.4));
    assert_eq!(config.cosmology.omega_m, 0.3);
    config.validate().unwrap();

    let reparsed =
        RunConfig::from_yaml_str(&serde_yaml::to_string(&config).unwrap()).unwrap();
    assert_eq!(reparsed, config);
}

#[test]
fn basename_switches_in_the_surrogate_branch() {
    let mut config = RunConfig::from_yaml_str(minimal_yaml()).unwrap();
    assert_eq!(config.basename(), "lag_fields_8");
    config.compute_cv_surrogate = true;
    assert_eq!(config.basename(), "lag_fields_filt_8");
    assert!(config
        .container_path()
        .to_string_lossy()
        .ends_with("lag_fields_filt_8.lagc"));
}

#[test]
fn zero_mesh_is_rejected() {
    let config = RunConfig::from_yaml_str("nmesh_in: 0\nlbox: 100.0\nicdir: /tmp\n").unwrap();
    assert_eq!(config.validate().unwrap_err().info().code, "nmesh-in");
}

#[test]
fn negative_box_is_rejected() {
    let config = RunConfig::from_yaml_str("nmesh_in: 8\nlbox: -5.0\nicdir: /tmp\n").unwrap();
    assert_eq!(config.validate().unwrap_err().info().code, "lbox");
}

#[test]
fn scale_dependent_growth_requires_the_ic_spectrum() {
    let yaml = "nmesh_in: 8\nlbox: 100.0\nicdir: /tmp\nscale_dependent_growth: true\nz_target: 0.0\n";
    let config = RunConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.validate().unwrap_err().info().code, "p-lin-ic");
}

#[test]
fn surrogate_branch_refuses_raw_ics() {
    let yaml = "nmesh_in: 8\nlbox: 100.0\nicdir: /tmp\nic_format: raw\ncompute_cv_surrogate: true\n";
    let config = RunConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.validate().unwrap_err().info().code, "surrogate-ics");
}

#[test]
fn manifest_round_trips_through_json() {
    let dir = tempdir().unwrap();
    let config = RunConfig::from_yaml_str(minimal_yaml()).unwrap();
    let summary = RunSummary {
        nmesh: 8,
        worker_count: 4,
        deltasq_mean: 0.25,
        tidesq_mean: 0.75,
        datasets: vec!["deltasq".into(), "delta".into()],
        container: Some(dir.path().join("lag_fields_8.lagc")),
        flattened: Vec::new(),
        elapsed_seconds: 1.5,
    };
    let provenance = RunProvenance {
        config_hash: "abc123".into(),
        worker_count: 4,
        created_at: "2026-01-01T00:00:00Z".into(),
        tool_versions: Default::default(),
    };
    let manifest = RunManifest::from_run(&config, &summary, provenance);
    assert_eq!(manifest.schema, SchemaVersion::default());

    let path = dir.path().join("manifest.json");
    manifest.write(&path).unwrap();
    let loaded = RunManifest::load(&path).unwrap();
    assert_eq!(loaded.config, config);
    assert_eq!(loaded.summary, summary);
    assert_eq!(loaded.datasets, summary.datasets);
}
