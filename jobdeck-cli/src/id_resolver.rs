//! ID resolver module
//!
//! Lets users type a short, unambiguous prefix instead of a full job id.

use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};
use jobdeck_client::SchedulerClient;
use jobdeck_core::domain::job::Job;

/// Resolve an id or prefix against a set of known ids
///
/// An exact match wins even when it is also a prefix of other ids.
/// Otherwise the input is matched case-insensitively as a prefix.
///
/// # Errors
/// Returns an error if:
/// - No id matches the prefix
/// - Multiple ids match the prefix (ambiguous)
pub fn match_id<'a>(ids: impl IntoIterator<Item = &'a str>, input: &str) -> Result<String> {
    let ids: BTreeSet<&str> = ids.into_iter().collect();

    if ids.contains(input) {
        return Ok(input.to_string());
    }

    let prefix = input.to_lowercase();
    let matches: Vec<&str> = ids
        .into_iter()
        .filter(|id| id.to_lowercase().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No job found with ID starting with '{}'", input)),
        [id] => Ok(id.to_string()),
        _ => Err(anyhow!(
            "Ambiguous prefix '{}' matches multiple jobs: {}",
            input,
            matches.join(", ")
        )),
    }
}

/// Resolve against the given job collections
pub fn match_job_id(collections: &[&[Job]], input: &str) -> Result<String> {
    match_id(
        collections
            .iter()
            .flat_map(|jobs| jobs.iter().map(|job| job.id.as_str())),
        input,
    )
}

/// Resolve a live job ID or prefix by querying the service
pub async fn resolve_job_id(client: &SchedulerClient, input: &str) -> Result<String> {
    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    match_job_id(&[jobs.as_slice()], input)
}
