//! treevol: tree volume and surface area from reconstructed meshes.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=treevol_io=debug` - Header and decode details per file
//! - `RUST_LOG=treevol_core=trace` - Every skipped face
//! - `RUST_LOG=debug` - All debug output
//!
//! Without `RUST_LOG`, `-v` enables info, `-vv` debug and `-vvv` trace.
//!
//! # Example
//!
//! ```bash
//! # Measure every mesh in a folder and write a CSV for a spreadsheet
//! treevol measure results/mesh --delimiter ';' -o volumes.csv
//!
//! # Collect volumes and heights from a reconstruction output folder
//! treevol collect out/ --format json -o volume_results.json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{collect, convert, header, measure};

/// treevol - tree volume and surface area from reconstructed meshes.
#[derive(Parser)]
#[command(name = "treevol")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(long, short, global = true)]
    pub output: Option<PathBuf>,

    /// CSV field delimiter
    #[arg(long, global = true, default_value_t = ',')]
    pub delimiter: char,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
    /// CSV, one row per mesh
    Csv,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EncodingArg {
    Ascii,
    BinaryLe,
    BinaryBe,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure volume and surface area of PLY meshes
    Measure {
        /// PLY files or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Collect volumes and heights from a reconstruction output directory
    Collect {
        /// Directory holding `<tree>_raycloud*.ply` outputs
        dir: PathBuf,
    },

    /// Show the decoded header of a PLY file
    Header {
        /// Input PLY file
        input: PathBuf,
    },

    /// Re-encode a PLY mesh
    Convert {
        /// Input PLY file
        input: PathBuf,

        /// Output PLY file
        destination: PathBuf,

        /// Target encoding
        #[arg(long, default_value = "binary-le")]
        encoding: EncodingArg,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "treevol_core=info,treevol_io=info,treevol=info",
            2 => "treevol_core=debug,treevol_io=debug,treevol=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Measure { inputs } => measure::run(inputs, &cli),
        Commands::Collect { dir } => collect::run(dir, &cli),
        Commands::Header { input } => header::run(input, &cli),
        Commands::Convert {
            input,
            destination,
            encoding,
        } => convert::run(input, destination, *encoding, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
