mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starstack", about = "Deep-sky frame registration and stacking tool")]
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
    /// Show image or snapshot metadata
    Info(commands::info::InfoArgs),
    /// Fingerprint the stars of a star sidecar
    Hash(commands::hash::HashArgs),
    /// Match two star sidecars
    Match(commands::match_cmd::MatchArgs),
    /// Flat-field normalize one image
    Flat(commands::flat::FlatArgs),
    /// Robust-stack registered snapshots
    Stack(commands::stack::StackArgs),
    /// Compute pixel scale and field of view
    Scale(commands::scale::ScaleArgs),
    /// Register and stack a set of exposures
    Run(commands::run::RunArgs),
    /// Print the default batch config
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
        Commands::Info(args) => commands::info::run(args),
        Commands::Hash(args) => commands::hash::run(args),
        Commands::Match(args) => commands::match_cmd::run(args),
        Commands::Flat(args) => commands::flat::run(args),
        Commands::Stack(args) => commands::stack::run(args),
        Commands::Scale(args) => commands::scale::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
