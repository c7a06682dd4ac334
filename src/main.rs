mod cli;
mod config;
mod error;
mod gmail;
mod google;
mod models;
mod sheets;
mod telegram;
#[cfg(test)]
mod test_support;
mod tools;

use clap::Parser;

use crate::cli::Cli;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize logging; stdout carries tool output only
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}
