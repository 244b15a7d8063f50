use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    fields::{self, FieldsArgs},
    inspect::{self, InspectArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "lag-sim", about = "Lagrangian bias basis-field derivation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the basis fields for a configuration across a worker group.
    Fields(FieldsArgs),
    /// List a field container's datasets with summary statistics.
    Inspect(InspectArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Fields(args) => fields::run(&args),
        Command::Inspect(args) => inspect::run(&args),
    }
}
