mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linescan", about = "Line-scan microscope calibration and background subtraction")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a line family from three points and preview it
    Lines(commands::lines::LinesArgs),
    /// Detect the line family in one frame of a stack
    Detect(commands::detect::DetectArgs),
    /// Estimate flat-field factors for a scan stack
    Calibrate(commands::calibrate::CalibrateArgs),
    /// Multiply a scan stack by a factor stack
    Apply(commands::apply::ApplyArgs),
    /// Subtract out-of-focus background from one or more scan stacks
    Subtract(commands::subtract::SubtractArgs),
    /// Print or save the default pipeline config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Lines(args) => commands::lines::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Apply(args) => commands::apply::run(args),
        Commands::Subtract(args) => commands::subtract::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
