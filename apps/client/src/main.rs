//! Client Entry Point
//!
//! Parses the command line, initializes logging and runs the selected
//! subcommand. Uses `anyhow` for startup errors; session errors are
//! `protocol::SessionError` and map to the exit status.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file before clap reads env fallbacks
    dotenvy::dotenv().ok();

    // Initialize tracing. Stdout belongs to the pow-worker protocol.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "client=info,protocol=info,pow=info,platform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli { command, connect } = Cli::parse();
    match command.unwrap_or(Commands::Connect(connect)) {
        Commands::Connect(args) => commands::connect(args).await,
        Commands::Benchmark(args) => commands::benchmark(args).await,
        Commands::ExtractPem(args) => commands::extract_pem(args),
        Commands::PowWorker(args) => commands::pow_worker(args).await,
    }
}
