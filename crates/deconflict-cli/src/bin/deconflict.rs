//! Flight schedule conflict analysis.
//!
//! Runs detection, resolution and hotspot aggregation over one or more
//! input documents and writes the JSON reports.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deconflict_cli::{load_config, load_navdata, plan_reports};
use deconflict_core::{AnalysisReport, Engine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Conflict detection and resolution for scheduled flights
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze flight schedules and write reports
    Analyze {
        /// Input documents (JSON)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Extra stations (JSON array)
        #[arg(long)]
        navdata: Option<PathBuf>,

        /// Report file, single input only
        #[arg(long, conflicts_with = "out_dir")]
        output: Option<PathBuf>,

        /// Directory for `<input>.report.json` files
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Pretty-print reports
        #[arg(long)]
        pretty: bool,
    },
    /// List the navigation database
    Stations {
        #[arg(long)]
        navdata: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("deconflict_core=debug,deconflict_cli=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("deconflict_core=info,deconflict_cli=info"))
    };
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json)?;

    match cli.command {
        Command::Analyze {
            inputs,
            config,
            navdata,
            output,
            out_dir,
            pretty,
        } => {
            let config = load_config(config.as_deref())?;
            let navdata = load_navdata(navdata.as_deref())?;
            let engine = Arc::new(Engine::new(config, navdata)?);
            analyze(engine, inputs, output, out_dir, pretty).await
        }
        Command::Stations { navdata } => {
            let navdata = load_navdata(navdata.as_deref())?;
            for station in navdata.stations() {
                println!(
                    "{:<8} {:<8} {:>9.4} {:>10.4}  {}",
                    station.code,
                    station.kind.as_str(),
                    station.lat,
                    station.lon,
                    station.name.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        Command::Config { config } => {
            let config = load_config(config.as_deref())?;
            config.validate()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn analyze(
    engine: Arc<Engine>,
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let destinations = plan_reports(&inputs, output.as_deref(), out_dir.as_deref())?;
    if let Some(dir) = &out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    // Runs are independent; each gets its own blocking task
    let handles: Vec<_> = inputs
        .into_iter()
        .zip(destinations)
        .map(|(input, destination)| {
            let engine = Arc::clone(&engine);
            let handle = tokio::task::spawn_blocking({
                let input = input.clone();
                move || run_one(&engine, &input)
            });
            (input, destination, handle)
        })
        .collect();

    let mut failures = 0;
    for (input, destination, handle) in handles {
        let report = match handle.await? {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("{}: {:#}", input.display(), e);
                failures += 1;
                continue;
            }
        };
        let s = &report.summary;
        tracing::info!(
            "{}: {} flights, {} conflicts, {} actions, {} remaining ({:?})",
            input.display(),
            s.total_flights,
            s.total_conflicts,
            s.actions,
            s.remaining_conflicts,
            s.termination
        );

        let json = if pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        match destination {
            Some(path) => {
                std::fs::write(&path, json)
                    .with_context(|| format!("writing report {}", path.display()))?;
                tracing::info!("Wrote {}", path.display());
            }
            None => println!("{json}"),
        }
    }

    if failures > 0 {
        bail!("{failures} input(s) failed");
    }
    Ok(())
}

fn run_one(engine: &Engine, input: &Path) -> Result<AnalysisReport> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("reading input {}", input.display()))?;
    engine
        .analyze_json(&text)
        .with_context(|| format!("analyzing {}", input.display()))
}
