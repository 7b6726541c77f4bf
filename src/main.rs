//! Command line driver: reads a map document, computes the candidate
//! network and writes it as GeoJSON

mod config;
mod error;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use heatnet_core::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, Overrides};
use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "heatnet", version, about = "Candidate district-heating network layouts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute connectors (and optionally the backbone) for a map
    Solve {
        /// Map document (JSON) with CRS, buildings and streets
        #[arg(short, long)]
        input: PathBuf,
        /// TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Connectors kept per building
        #[arg(short = 'k', long)]
        candidates: Option<usize>,
        /// Compute the Steiner tree backbone over all buildings
        #[arg(long)]
        backbone: bool,
        /// Write WGS84 coordinates instead of the map CRS
        #[arg(long)]
        wgs84: bool,
        #[arg(long)]
        pretty: bool,
        /// Worker threads for the parallel phases
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print how a CRS designator is understood
    Crs { designator: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Solve {
            input,
            config,
            output,
            candidates,
            backbone,
            wgs84,
            pretty,
            threads,
        } => {
            let config = match config {
                Some(path) => Config::load(&path)?,
                None => Config::default(),
            };
            let config = config.apply(Overrides {
                candidates,
                backbone,
                wgs84,
                pretty,
                threads,
            });
            solve(&input, output.as_deref(), &config)
        }
        Command::Crs { designator } => {
            let crs = CrsId::parse(&designator);
            if crs.is_valid() {
                println!("{crs} (code {})", crs.code);
            } else {
                warn!("'{designator}' is not a known CRS designator");
                println!("{crs} (invalid)");
            }
            Ok(())
        }
    }
}

fn solve(input: &Path, output: Option<&Path>, config: &Config) -> Result<(), CliError> {
    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let text = std::fs::read_to_string(input).map_err(|e| CliError::io(input, e))?;
    let map: GeoMap = serde_json::from_str(&text)?;
    info!(
        "Read map with {} buildings and {} streets (CRS: {})",
        map.buildings.len(),
        map.streets.len(),
        map.crs.as_deref().unwrap_or("unknown")
    );

    // fail before the solve if the output cannot be projected
    let projector = if config.output.wgs84 {
        Some(Projector::to_wgs84_for(&map)?)
    } else {
        None
    };

    let solution = Solution::calculate(&map, &config.solve);
    if solution.is_empty() {
        warn!("No network possible: map has no usable buildings or streets");
    }
    info!(
        "Solution with {} connectors and {} street sections, backbone length {:.2}",
        solution.connectors.len(),
        solution.sections.len(),
        solution.backbone_length()
    );

    let collection = solution.to_geojson(projector.as_ref())?;
    let text = if config.output.pretty {
        serde_json::to_string_pretty(&collection)?
    } else {
        serde_json::to_string(&collection)?
    };

    match output {
        Some(path) => std::fs::write(path, text).map_err(|e| CliError::io(path, e))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").map_err(|e| CliError::io(Path::new("<stdout>"), e))?;
        }
    }
    Ok(())
}
