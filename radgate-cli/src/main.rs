//! radgate command line
//!
//! Transparent RADIUS relay with a gating/observer plugin pipeline.

// Use mimalloc as the global allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "radgate",
    author,
    version,
    about = "Transparent RADIUS relay with a plugin pipeline",
    long_about = "radgate sits between RADIUS clients and one upstream server.\n\n\
                  It forwards authentication traffic unchanged, lets plugins veto or observe it, \
                  and can run as an accounting sink.",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay or accounting sink described by a config file
    Run(commands::run::RunArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
