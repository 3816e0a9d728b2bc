mod commands;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "vernier", about = "Live video measurement tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Viewer config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List capture devices and their formats
    Sources(commands::sources::SourcesArgs),
    /// Run the viewer loop headless for a number of frames
    Run(commands::run::RunArgs),
    /// Measure a line or circle between pixel points
    Measure(commands::measure::MeasureArgs),
    /// Print or save the default viewer config
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

    let config = commands::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Sources(args) => commands::sources::run(args, &config),
        Commands::Run(args) => commands::run::run(args, &config),
        Commands::Measure(args) => commands::measure::run(args, &config),
        Commands::Config(args) => commands::config::run(args),
    }
}
