use clap::{Parser, Subcommand, ValueEnum};
use slopestats::UnitSystem;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands {
    pub mod list;
    pub mod name;
    pub mod stats;
}

use commands::list::list_command;
use commands::name::name_command;
use commands::stats::stats_command;

#[derive(Parser)]
#[command(
    name = "slopestats",
    version,
    about = "Ride statistics for recorded ski and snowboard tracks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Unit system for distances, speeds and elevations
    #[arg(
        long,
        global = true,
        value_enum,
        env = "SLOPESTATS_UNITS",
        default_value_t = UnitSystem::Metric
    )]
    units: UnitSystem,

    /// Output format
    #[arg(
        long,
        global = true,
        value_enum,
        env = "SLOPESTATS_OUTPUT",
        default_value_t = OutputFormat::Text
    )]
    output: OutputFormat,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print the display name and ride statistics of a .json or .gpx track")]
    Stats { file: PathBuf },
    #[command(about = "Print the display name of a track")]
    Name { file: PathBuf },
    #[command(about = "List the tracks in a directory with their display names")]
    List { dir: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Stats { file } => stats_command(&file, cli.units, cli.output),
        Commands::Name { file } => name_command(&file, cli.output),
        Commands::List { dir } => list_command(&dir, cli.output),
    }
}
