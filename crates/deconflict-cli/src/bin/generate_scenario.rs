//! Write a synthetic flight schedule as an `analyze` input document.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use deconflict_cli::load_navdata;
use deconflict_cli::sim::{
    create_converging_scenario, create_crossing_scenario, create_random_scenario,
    create_triangle_scenario,
};
use std::path::PathBuf;

/// Available scenarios
#[derive(Debug, Clone, ValueEnum)]
enum ScenarioType {
    /// Two flights crossing at the center
    Crossing,
    /// Three flights with every pair in conflict
    Triangle,
    /// Flights from evenly spaced bearings into one airport
    Converging,
    /// Random schedule over the built-in airports
    Random,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, value_enum, default_value = "crossing")]
    scenario: ScenarioType,

    /// Number of flights (converging, random)
    #[arg(long, default_value_t = 8)]
    count: usize,

    /// RNG seed (random)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Center latitude (default: Ottawa)
    #[arg(long, default_value_t = 45.3225)]
    lat: f64,

    /// Center longitude (default: Ottawa)
    #[arg(long, default_value_t = -75.6692)]
    lon: f64,

    /// First departure time (RFC 3339)
    #[arg(long, default_value = "2024-01-01T12:00:00Z")]
    start: DateTime<Utc>,

    /// Departure spread in hours (random)
    #[arg(long, default_value_t = 6)]
    window_hours: u32,

    /// Extra stations to draw random routes from
    #[arg(long)]
    navdata: Option<PathBuf>,

    /// Output file; stdout if omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let scenario = match args.scenario {
        ScenarioType::Crossing => create_crossing_scenario(args.lat, args.lon, args.start),
        ScenarioType::Triangle => create_triangle_scenario(args.lat, args.lon, args.start),
        ScenarioType::Converging => {
            create_converging_scenario(args.lat, args.lon, args.count, args.start)
        }
        ScenarioType::Random => {
            let navdata = load_navdata(args.navdata.as_deref())?;
            create_random_scenario(&navdata, args.count, args.seed, args.start, args.window_hours)
        }
    };

    let document = scenario.to_document()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, document)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "Scenario '{}': {} flights written to {}",
                scenario.name,
                scenario.flights.len(),
                path.display()
            );
        }
        None => println!("{document}"),
    }
    Ok(())
}
