//! # OPM Simulator Binary
//!
//! Standalone batch that synthesizes a full operational history and dumps
//! the five tables as CSV seed files.
//!
//! # Usage
//!
//! ```bash
//! # Reference parameters, CSVs under ./data
//! opm_simulator
//!
//! # Custom parameters and output location
//! opm_simulator --config simulation.toml --output /var/lib/opm/seed
//!
//! # Reproduce a specific run
//! opm_simulator --seed 1234 -v
//! ```

use clap::Parser;
use opm_common::config::ConfigLoader;
use opm_simulator::config::SimulationConfig;
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// OPM Simulator - operational history synthesis for a machine fleet
#[derive(Parser, Debug)]
#[command(name = "opm_simulator")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Synthesizes machine events, downtimes, production and sensor data")]
#[command(long_about = None)]
struct Args {
    /// Path to simulation configuration (TOML). Defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the CSV tables are written to
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Override the configured RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("simulation failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("OPM Simulator v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    info!(
        machines = config.simulation.machine_count,
        seed = config.simulation.seed,
        start = %config.simulation.start,
        end = %config.simulation.end,
        "simulation window"
    );

    let dataset = opm_simulator::generate_dataset(&config)?;
    dataset.write_csv_dir(&args.output)?;

    info!(
        dir = %args.output.display(),
        equipments = dataset.equipments.len(),
        events = dataset.events.len(),
        downtimes = dataset.downtimes.len(),
        production = dataset.production.len(),
        sensors = dataset.sensors.len(),
        "CSV tables written"
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
