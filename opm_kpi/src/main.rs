//! # OPM KPI Query Binary
//!
//! Command-line front end over a CSV-dumped dataset. Each subcommand maps
//! to one query operation and prints JSON rows, so the output can be piped
//! straight into other tooling or diffed across runs (the engine is
//! deterministic).
//!
//! # Usage
//!
//! ```bash
//! # Per-machine KPIs for January 2023
//! opm_kpi --data data kpis --from 2023-01-01 --to 2023-02-01
//!
//! # Downtime breakdown for one machine
//! opm_kpi reasons --from 2023-01-01 --to 2023-02-01 --equipment MCH003
//!
//! # Sensor trace around a failure
//! opm_kpi sensors --from "2023-03-10 00:00:00" --to "2023-03-11 00:00:00" \
//!     --equipment MCH003 --sensor-type Vibration_Bearing
//! ```

use clap::{Parser, Subcommand};
use opm_common::store::Dataset;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

/// OPM KPI - query per-machine analytics over a dumped dataset
#[derive(Parser, Debug)]
#[command(name = "opm_kpi")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "OEE, MTBF/MTTR and downtime analytics over OPM CSV tables")]
#[command(long_about = None)]
struct Args {
    /// Directory holding the five CSV tables
    #[arg(short, long, env = "OPM_DATA_DIR", default_value = "data")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all equipments
    Equipments,
    /// Per-machine OEE / MTBF / MTTR for a date window
    Kpis {
        /// Window start, YYYY-MM-DD (inclusive)
        #[arg(long)]
        from: String,
        /// Window end, YYYY-MM-DD (exclusive)
        #[arg(long)]
        to: String,
        /// Restrict to one machine
        #[arg(long)]
        equipment: Option<String>,
    },
    /// Downtime totals by (equipment, category, reason)
    Reasons {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        equipment: Option<String>,
    },
    /// Raw sensor readings, ordered by timestamp
    Sensors {
        /// Window start, YYYY-MM-DD HH:MM:SS (inclusive)
        #[arg(long)]
        from: String,
        /// Window end, YYYY-MM-DD HH:MM:SS (exclusive)
        #[arg(long)]
        to: String,
        #[arg(long)]
        equipment: Option<String>,
        #[arg(long)]
        sensor_type: Option<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        error!("query failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(args.verbose);

    let dataset = Dataset::read_csv_dir(&args.data)?;

    match &args.command {
        Command::Equipments => print_rows(&opm_kpi::service::list_equipments(&dataset))?,
        Command::Kpis {
            from,
            to,
            equipment,
        } => print_rows(&opm_kpi::service::compute_kpis(
            &dataset,
            from,
            to,
            equipment.as_deref(),
        )?)?,
        Command::Reasons {
            from,
            to,
            equipment,
        } => print_rows(&opm_kpi::service::downtime_reasons(
            &dataset,
            from,
            to,
            equipment.as_deref(),
        )?)?,
        Command::Sensors {
            from,
            to,
            equipment,
            sensor_type,
        } => print_rows(&opm_kpi::service::sensor_data(
            &dataset,
            from,
            to,
            equipment.as_deref(),
            sensor_type.as_deref(),
        )?)?,
    }
    Ok(())
}

fn print_rows<T: Serialize>(rows: &[T]) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
