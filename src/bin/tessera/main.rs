//! Tessera-PQC CLI: atomic post-quantum NTT simulation on intermittent power.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tessera", about = "Intermittent atomic-NTT crypto simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the intermittent-power scheduler simulation.
    Run(cmd::run::Args),
    /// Verify the forward/inverse NTT round-trip invariant.
    Verify(cmd::verify::Args),
    /// Run a toy KEM keygen/encaps/decaps trial.
    Kem(cmd::kem::Args),
    /// Walk through all three phases in one narrated run.
    Demo(cmd::demo::Args),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => cmd::run::execute(args),
        Commands::Verify(args) => cmd::verify::execute(args),
        Commands::Kem(args) => cmd::kem::execute(args),
        Commands::Demo(args) => cmd::demo::execute(args),
    }
}
