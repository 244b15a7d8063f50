use std::error::Error;
use std::path::PathBuf;

use clap::Args as ClapArgs;
use lag_store::container::open_container;

#[derive(ClapArgs, Debug)]
pub struct InspectArgs {
    /// Field container to inspect.
    #[arg(long)]
    pub store: PathBuf,
}

pub fn run(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let container = open_container(&args.store)?;
    println!(
        "{}: nmesh {} ({} datasets)",
        args.store.display(),
        container.nmesh,
        container.fields.len()
    );
    for (name, data) in &container.fields {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &value in data {
            min = min.min(value);
            max = max.max(value);
            sum += value as f64;
        }
        let mean = sum / data.len() as f64;
        println!(
            "  {name}: len {} min {min:.6e} max {max:.6e} mean {mean:.6e}",
            data.len()
        );
    }
    Ok(())
}
