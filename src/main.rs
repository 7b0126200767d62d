//! cladesim - Entry Point
//!
//! Reads a TOML control file, simulates the requested number of
//! birth-death tree replicates, and writes the Newick tree file and the
//! rate-shift event table.

use std::path::PathBuf;

use clap::Parser;

use cladesim::config::Settings;
use cladesim::core::error::Result;
use cladesim::random::SimRng;
use cladesim::sim::SimEngine;

/// Birth-death phylogeny simulator with lineage-specific rate shifts
#[derive(Parser, Debug)]
#[command(name = "cladesim")]
#[command(about = "Simulate birth-death trees with Poisson rate-shift events")]
struct Args {
    /// Path to the TOML control file
    control: PathBuf,

    /// Override a control-file parameter, e.g. --set numberOfSims=10
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Random seed; takes precedence over the control file's seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::load(&args.control, &args.set)?;

    let seed = args
        .seed
        .or_else(|| (settings.seed >= 0).then(|| settings.seed as u64))
        .unwrap_or_else(rand::random);
    tracing::info!("seed: {}", seed);
    let mut rng = SimRng::seed_from_u64(seed);

    let engine = SimEngine::new(&settings);
    let summary = engine.run(&mut rng)?;
    tracing::info!("{}", summary.summary());
    Ok(())
}
