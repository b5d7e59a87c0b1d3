//! Marquee CLI - Command-line interface
//!
//! Looks movies up across IMDb, Metacritic, Rotten Tomatoes and TMDB.

mod commands;

use clap::Parser;
use marquee_core::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Movie metadata from IMDb, Metacritic, Rotten Tomatoes and TMDB")]
struct Cli {
    /// Console log level (the full trace always goes to logs/)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn, global = true)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), None)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    commands::handle_command(cli.command).await
}
