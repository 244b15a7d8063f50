use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args as ClapArgs;
use lag_core::worker::spawn_workers;
use lag_core::{sha256_hex, RunProvenance};
use lag_pipeline::config::RunConfig;
use lag_pipeline::controller::make_lag_fields;
use lag_pipeline::manifest::RunManifest;

#[derive(ClapArgs, Debug)]
pub struct FieldsArgs {
    /// YAML configuration describing the derivation run.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory, overriding the configuration's `outdir`.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Number of SPMD workers to decompose the mesh across.
    #[arg(long, default_value_t = 1)]
    pub workers: usize,
}

pub fn run(args: &FieldsArgs) -> Result<(), Box<dyn Error>> {
    let contents = fs::read_to_string(&args.config)?;
    let mut config = RunConfig::from_yaml_str(&contents)?;
    if let Some(out) = &args.out {
        config.outdir = Some(out.clone());
    }
    config.validate()?;
    let outdir = config.outdir();
    fs::create_dir_all(&outdir)?;

    let config_ref = &config;
    let mut summaries = spawn_workers(args.workers, |ctx| {
        make_lag_fields(&ctx, config_ref, true).map(|(_fields, summary)| summary)
    })?;
    let summary = summaries.remove(0)?;

    let mut tool_versions = BTreeMap::new();
    tool_versions.insert("lag-sim".to_string(), env!("CARGO_PKG_VERSION").to_string());
    let provenance = RunProvenance {
        config_hash: sha256_hex(contents.as_bytes()),
        worker_count: args.workers,
        created_at: Utc::now().to_rfc3339(),
        tool_versions,
    };

    let manifest = RunManifest::from_run(&config, &summary, provenance);
    manifest.write(&outdir.join("manifest.json"))?;
    fs::write(
        outdir.join("summary.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    // Persist the configuration alongside the outputs for reproducibility.
    fs::copy(&args.config, outdir.join("config.yaml")).ok();

    println!(
        "derived {} datasets on {} workers in {:.2}s",
        summary.datasets.len(),
        summary.worker_count,
        summary.elapsed_seconds
    );
    if let Some(container) = &summary.container {
        println!("container: {}", container.display());
    }
    for path in &summary.flattened {
        println!("flattened: {}", path.display());
    }
    Ok(())
}
