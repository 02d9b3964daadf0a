//! sim-regress - Regression-test driver for simulation executables
//!
//! Runs each scenario's simulation, checks the scraped result against its
//! reference, and exits with a status a test harness can consume.

use std::path::PathBuf;

use clap::Parser;
use sim_regress::common::{config::Config, logging};
use sim_regress::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "sim-regress", about = "Simulation regression-test driver")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    let result = match Config::load(cli.config.as_deref()) {
        Ok(config) => cli::dispatch(cli.command, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
