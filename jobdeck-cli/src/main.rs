//! Jobdeck CLI
//!
//! Command-line dashboard for a job scheduling service.

mod commands;
mod config;
mod id_resolver;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::{Config, DEFAULT_SCHEDULER_URL, DEFAULT_TIMEOUT_SECS};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jobdeck")]
#[command(about = "Scheduled HTTP job dashboard", long_about = None)]
struct Cli {
    /// Scheduling service URL
    #[arg(
        long,
        global = true,
        env = "JOBDECK_SCHEDULER_URL",
        default_value = DEFAULT_SCHEDULER_URL
    )]
    scheduler_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "JOBDECK_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with tables
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobdeck=warn,jobdeck_client=warn,jobdeck_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::new(cli.scheduler_url, Duration::from_secs(cli.timeout));

    let outcome = match config.validate() {
        Ok(()) => handle_command(cli.command, &config).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
