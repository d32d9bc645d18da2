//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod watch;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List scheduled or completed jobs
    List(job::ListArgs),
    /// Show job details
    Show {
        /// Job ID or unambiguous prefix
        id: String,

        /// Pick one completed run of the job (RFC 3339)
        #[arg(long)]
        completed_at: Option<String>,
    },
    /// Create a job
    Create {
        /// Job ID; the service generates one when omitted
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        fields: job::JobFields,
    },
    /// Update a job; omitted options keep their current value
    Update {
        /// Job ID or unambiguous prefix
        id: String,

        #[command(flatten)]
        fields: job::JobFields,
    },
    /// Pause a job
    Pause {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Resume a paused job
    Resume {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Delete a job
    Delete {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Watch live countdowns to each job's next run
    Watch(watch::WatchArgs),
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        Commands::List(args) => job::list_jobs(&client, args).await,
        Commands::Show { id, completed_at } => {
            job::show_job(&client, &id, completed_at.as_deref()).await
        }
        Commands::Create { id, fields } => job::create_job(&client, id, fields).await,
        Commands::Update { id, fields } => job::update_job(&client, &id, fields).await,
        Commands::Pause { id } => job::pause_job(&client, &id).await,
        Commands::Resume { id } => job::resume_job(&client, &id).await,
        Commands::Delete { id } => job::delete_job(&client, &id).await,
        Commands::Watch(args) => watch::watch_jobs(&client, args).await,
    }
}
