//! pixband CLI

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod report;

#[derive(Parser)]
#[command(name = "pixband")]
#[command(about = "pixband - pixel bandwidth pile-up reporting")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

/// Container snapshot selection, shared by every subcommand.
#[derive(Args)]
struct StoreArgs {
    /// Input container snapshot (JSON export)
    #[arg(short, long)]
    input: PathBuf,

    /// Run number; the snapshot must contain `run_<RUN>/Pixel/`
    #[arg(long)]
    run: String,
}

/// Cleaning and remapping parameters, shared by the pile-up commands.
#[derive(Args, Clone)]
struct RemapArgs {
    /// Startup lumi blocks to zero out (known-bad period)
    #[arg(long, default_value = "246")]
    bad_lbs: usize,

    /// Lower edge of the accepted pile-up range
    #[arg(long, default_value = "2.5")]
    pu_min: f64,

    /// Upper edge of the accepted pile-up range
    #[arg(long, default_value = "82.5")]
    pu_max: f64,

    /// Pile-up bucket width
    #[arg(long, default_value = "5.0")]
    bin_width: f64,

    /// Post-scale factor on remapped errors (systematic spread)
    #[arg(long, default_value = "1.0")]
    error_scale: f64,

    /// Lumi blocks to veto, comma separated
    #[arg(long, value_delimiter = ',')]
    veto: Vec<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce the standard per-run report: occupancy stacks vs.
    /// pile-up and vs. lumi block, plus the pile-up table
    Report {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        remap: RemapArgs,

        /// LHC fill number, recorded in the report metadata
        #[arg(long)]
        fill: Option<String>,

        /// Headroom factor for the auto-computed y maximum
        #[arg(long, default_value = "1.3")]
        margin: f64,

        /// Output directory for artifacts. Defaults to the working dir.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List per-module series matching a pattern
    Modules {
        #[command(flatten)]
        store: StoreArgs,

        /// Regex filter over `component/subcomponent/module` names
        /// (search semantics; empty matches everything)
        #[arg(long, default_value = "")]
        pattern: String,
    },

    /// Aggregate per-module series into one curve per region
    Regions {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        remap: RemapArgs,

        /// Region labels; each selects modules via `^<label>/`
        #[arg(long, value_delimiter = ',', default_values_t = report::default_regions())]
        regions: Vec<String>,

        /// Output directory for artifacts. Defaults to the working dir.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the pile-up occupancy table
    Table {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        remap: RemapArgs,
    },

    /// Module spread distributions at a fixed pile-up point
    Spread {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        remap: RemapArgs,

        /// Pile-up point to sample
        #[arg(long, default_value = "75.0")]
        pu: f64,

        /// Accepted distance from the target pile-up
        #[arg(long, default_value = "2.5")]
        tolerance: f64,

        /// Regex filter over module names
        #[arg(long, default_value = "")]
        pattern: String,

        /// Slice the spread by module eta index instead
        #[arg(long)]
        eta: bool,

        /// Output directory for artifacts. Defaults to the working dir.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Report { store, remap, fill, margin, output } => {
            report::cmd_report(&store, &remap, fill, margin, output.as_deref())
        }
        Commands::Modules { store, pattern } => report::cmd_modules(&store, &pattern),
        Commands::Regions { store, remap, regions, output } => {
            report::cmd_regions(&store, &remap, &regions, output.as_deref())
        }
        Commands::Table { store, remap } => report::cmd_table(&store, &remap),
        Commands::Spread { store, remap, pu, tolerance, pattern, eta, output } => {
            report::cmd_spread(&store, &remap, pu, tolerance, &pattern, eta, output.as_deref())
        }
    }
}
