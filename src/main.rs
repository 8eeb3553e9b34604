#![cfg(not(tarpaulin_include))]

use clap::Parser;
use optistock::app;
use optistock::config::Config;

/// Main entry point for the web application
///
/// Reads the settings from the command line (or `OPTISTOCK_*` environment
/// variables) and serves the inventory web app until interrupted.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    app::run(config).await
}
