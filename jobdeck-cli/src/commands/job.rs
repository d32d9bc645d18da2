//! Job command handlers
//!
//! Listing, inspecting, creating, updating and toggling jobs.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use colored::*;
use jobdeck_client::{SchedulerClient, SubmitError, SubmitGuard};
use jobdeck_core::domain::job::{
    BadgeVariant, HttpMethod, Job, JobAction, JobStatus, Trigger, TriggerKind,
};
use jobdeck_core::form::{JobForm, parse_run_date};
use jobdeck_core::time::{parse_instant, remaining_string};
use jobdeck_core::view::{JobFilter, Selection, SortOrder, sort_completed, sort_scheduled};
use serde_json::Value;

use crate::id_resolver::{match_job_id, resolve_job_id};

/// Facets shared by `list` and `watch`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only jobs with this trigger type (repeatable)
    #[arg(long = "kind", value_name = "KIND")]
    pub kinds: Vec<TriggerKind>,

    /// Only jobs with this status (repeatable)
    #[arg(long = "status", value_name = "STATUS")]
    pub statuses: Vec<JobStatus>,

    /// Case-insensitive text to look for in id, name, url, method, status or type
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> JobFilter {
        JobFilter {
            kinds: self.kinds.clone(),
            statuses: self.statuses.clone(),
            search: self.search.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// List concluded runs instead of live jobs
    #[arg(long)]
    pub completed: bool,

    /// Reverse the default order
    #[arg(long)]
    pub reverse: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Job definition options for `create` and `update`
#[derive(Args, Debug, Default)]
pub struct JobFields {
    #[arg(long)]
    pub name: Option<String>,

    /// URL the job calls
    #[arg(long)]
    pub url: Option<String>,

    /// HTTP method (GET, POST, PUT, DELETE, UPDATE)
    #[arg(long)]
    pub method: Option<HttpMethod>,

    /// Request headers as a JSON object
    #[arg(long)]
    pub headers: Option<String>,

    /// Request body as JSON
    #[arg(long)]
    pub body: Option<String>,

    /// Run once, this many seconds from now
    #[arg(long)]
    pub delay: Option<String>,

    /// Run once at this local time (YYYY-MM-DD HH:MM[:SS])
    #[arg(long)]
    pub run_date: Option<String>,

    /// Run on a five-field cron schedule
    #[arg(long, conflicts_with_all = ["delay", "run_date"])]
    pub cron: Option<String>,
}

impl JobFields {
    /// Overwrite the form fields that were given
    ///
    /// Picking a delay clears a previously set run date and vice versa, so an
    /// update can switch between the two.
    pub fn apply(self, form: &mut JobForm) -> Result<()> {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(url) = self.url {
            form.url = url;
        }
        if let Some(method) = self.method {
            form.method = method;
        }
        if let Some(headers) = self.headers {
            form.headers = headers;
        }
        if let Some(body) = self.body {
            form.body = body;
        }

        let run_date = self
            .run_date
            .as_deref()
            .map(parse_run_date)
            .transpose()
            .context("Invalid --run-date")?;

        match (self.delay, run_date) {
            (Some(delay), Some(run_date)) => {
                // Both given: let validation report the conflict
                form.delay = delay;
                form.run_date = Some(run_date);
                form.trigger_kind = TriggerKind::OneTime;
            }
            (Some(delay), None) => {
                form.delay = delay;
                form.run_date = None;
                form.trigger_kind = TriggerKind::OneTime;
            }
            (None, Some(run_date)) => {
                form.delay.clear();
                form.run_date = Some(run_date);
                form.trigger_kind = TriggerKind::OneTime;
            }
            (None, None) => {}
        }

        if let Some(cron) = self.cron {
            form.cron_expression = cron;
            form.trigger_kind = TriggerKind::Cron;
        }

        Ok(())
    }
}

/// List live or completed jobs
pub async fn list_jobs(client: &SchedulerClient, args: ListArgs) -> Result<()> {
    let jobs = if args.completed {
        client.list_completed_jobs().await
    } else {
        client.list_jobs().await
    }
    .context("Failed to fetch jobs")?;

    let filter = args.filter.to_filter();
    let mut shown = filter.apply(&jobs);

    if args.completed {
        let order = if args.reverse {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        };
        sort_completed(&mut shown, order);
    } else {
        let order = if args.reverse {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        sort_scheduled(&mut shown, order);
    }

    let noun = if args.completed { "completed job" } else { "job" };
    if shown.is_empty() {
        println!("{}", format!("No {}s found.", noun).yellow());
        return Ok(());
    }

    if filter.is_filtered() {
        println!(
            "{}",
            format!("Showing {} of {} {}(s):", shown.len(), jobs.len(), noun).bold()
        );
    } else {
        println!("{}", format!("Found {} {}(s):", shown.len(), noun).bold());
    }
    println!();
    for job in shown {
        print_job_summary(job);
    }

    Ok(())
}

/// Show one job, live or completed
pub async fn show_job(
    client: &SchedulerClient,
    input: &str,
    completed_at: Option<&str>,
) -> Result<()> {
    let completed_at = completed_at
        .map(parse_instant)
        .transpose()
        .context("Invalid --completed-at")?;

    let (active, completed) = tokio::try_join!(client.list_jobs(), client.list_completed_jobs())
        .context("Failed to fetch jobs")?;

    let id = match_job_id(&[active.as_slice(), completed.as_slice()], input)?;
    let selection = Selection { id, completed_at };

    let job = selection.resolve(&active, &completed).or_else(|| {
        // Without a completion time, the latest run stands in for the job
        if selection.completed_at.is_some() {
            return None;
        }
        completed
            .iter()
            .filter(|job| job.id == selection.id)
            .max_by_key(|job| job.completed_at())
    });

    match job {
        Some(job) => print_job_details(job),
        None => println!("{}", format!("Job {} not found.", selection.id).yellow()),
    }

    Ok(())
}

/// Create a job from command-line options
pub async fn create_job(
    client: &SchedulerClient,
    id: Option<String>,
    fields: JobFields,
) -> Result<()> {
    let mut form = JobForm::new();
    if let Some(id) = id {
        form.id = id;
    }
    fields.apply(&mut form)?;

    let job = submit(client, &form).await?;

    println!("{} Created job {}", "✓".green(), job.id.cyan());
    println!();
    print_job_details(&job);

    Ok(())
}

/// Update a live job; options not given keep the job's current values
pub async fn update_job(client: &SchedulerClient, input: &str, fields: JobFields) -> Result<()> {
    let id = resolve_job_id(client, input).await?;
    let job = client
        .get_job(&id)
        .await
        .with_context(|| format!("Failed to fetch job {}", id))?;
    require_action(&job, JobAction::Edit)?;

    let mut form = JobForm::edit(&job);
    fields.apply(&mut form)?;

    let job = submit(client, &form).await?;

    println!("{} Updated job {}", "✓".green(), job.id.cyan());
    println!();
    print_job_details(&job);

    Ok(())
}

pub async fn pause_job(client: &SchedulerClient, input: &str) -> Result<()> {
    let job = find_live_job(client, input).await?;
    require_action(&job, JobAction::Pause)?;

    client
        .pause_job(&job.id)
        .await
        .with_context(|| format!("Failed to pause job {}", job.id))?;

    println!("{} Paused job {}", "✓".green(), job.id.cyan());
    Ok(())
}

pub async fn resume_job(client: &SchedulerClient, input: &str) -> Result<()> {
    let job = find_live_job(client, input).await?;
    require_action(&job, JobAction::Resume)?;

    client
        .resume_job(&job.id)
        .await
        .with_context(|| format!("Failed to resume job {}", job.id))?;

    println!("{} Resumed job {}", "✓".green(), job.id.cyan());
    Ok(())
}

pub async fn delete_job(client: &SchedulerClient, input: &str) -> Result<()> {
    let job = find_live_job(client, input).await?;
    require_action(&job, JobAction::Delete)?;

    client
        .remove_job(&job.id)
        .await
        .with_context(|| format!("Failed to delete job {}", job.id))?;

    println!("{} Deleted job {}", "✓".green(), job.id.cyan());
    Ok(())
}

async fn find_live_job(client: &SchedulerClient, input: &str) -> Result<Job> {
    let jobs = client.list_jobs().await.context("Failed to fetch jobs")?;
    let id = match_job_id(&[jobs.as_slice()], input)?;

    jobs.into_iter()
        .find(|job| job.id == id)
        .ok_or_else(|| anyhow!("No job found with ID '{}'", id))
}

fn require_action(job: &Job, action: JobAction) -> Result<()> {
    if job.actions().contains(&action) {
        Ok(())
    } else {
        bail!(
            "Cannot {} job {} while it is {}",
            action_name(action),
            job.id,
            job.status
        )
    }
}

/// Validate and send a form, printing field errors inline
async fn submit(client: &SchedulerClient, form: &JobForm) -> Result<Job> {
    match SubmitGuard::new().submit(client, form).await {
        Ok(job) => Ok(job),
        Err(SubmitError::Invalid(errors)) => {
            for error in errors.iter() {
                eprintln!("  {} {}", format!("{}:", error.field).red(), error.message);
            }
            bail!("Job is invalid ({} problem(s))", errors.len())
        }
        Err(e) => Err(e).context("Failed to save job"),
    }
}

fn action_name(action: JobAction) -> &'static str {
    match action {
        JobAction::Edit => "edit",
        JobAction::Pause => "pause",
        JobAction::Resume => "resume",
        JobAction::Delete => "delete",
    }
}

pub(super) fn format_local(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn describe_trigger(trigger: &Trigger) -> String {
    match trigger {
        Trigger::Cron(fields) => format!("{} ({})", trigger.kind().label(), fields),
        Trigger::OneTime(fields) => match fields.date {
            Some(date) => format!("{} ({})", trigger.kind().label(), format_local(date)),
            None => trigger.kind().label().to_string(),
        },
    }
}

/// Print a job summary
fn print_job_summary(job: &Job) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        job.id.dimmed(),
        job.name.as_deref().unwrap_or_default().bold()
    );
    println!("    Status:    {}", colorize_status(&job.status));
    println!("    Type:      {}", describe_trigger(&job.trigger));
    println!(
        "    Request:   {} {}",
        job.request.method.as_str().cyan(),
        job.request.url
    );

    if let Some(completed_at) = job.completed_at() {
        println!("    Completed: {}", format_local(completed_at).dimmed());
    } else if let Some(target) = job.countdown_target() {
        println!(
            "    Next run:  {} (in {})",
            format_local(target).dimmed(),
            remaining_string(target)
        );
    }
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.id.cyan());
    if let Some(name) = &job.name {
        println!("  Name:      {}", name);
    }
    println!("  Status:    {}", colorize_status(&job.status));
    println!("  Type:      {}", describe_trigger(&job.trigger));
    println!("  Created:   {}", format_local(job.created_at));

    if let Some(target) = job.countdown_target() {
        println!(
            "  Next run:  {} (in {})",
            format_local(target),
            remaining_string(target)
        );
    }

    let actions = job.actions();
    if !actions.is_empty() {
        let names: Vec<&str> = actions.into_iter().map(action_name).collect();
        println!("  Actions:   {}", names.join(", ").dimmed());
    }

    println!("\n{}", "Request:".bold());
    println!("  {} {}", job.request.method.as_str().cyan(), job.request.url);
    if let Some(headers) = &job.request.headers {
        println!("\n{}", "Headers:".bold());
        println!("{}", pretty(&Value::Object(headers.clone())));
    }
    if let Some(body) = job.request.body.as_ref().filter(|body| !body.is_null()) {
        println!("\n{}", "Body:".bold());
        println!("{}", pretty(body));
    }

    if let Some(result) = &job.result {
        println!("\n{}", "Result:".bold());
        println!("  Completed: {}", format_local(result.completed_at));

        if let Some(response) = &result.response {
            let code = response.status_code.to_string();
            let code = if (200..300).contains(&response.status_code) {
                code.green()
            } else {
                code.red()
            };
            println!("  Status:    {}", code);

            if let Some(body) = response.body.as_ref().filter(|body| !body.is_null()) {
                println!("\n{}", "Response:".bold());
                println!("{}", pretty(body));
            }
        }

        if let Some(error) = &result.error_message {
            println!("\n{}", "Error:".bold());
            println!("{}", error.red());
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Colorize job status according to its badge
pub(super) fn colorize_status(status: &JobStatus) -> ColoredString {
    let status_str = status.as_str();
    match status.badge_variant() {
        BadgeVariant::Default => status_str.normal(),
        BadgeVariant::Secondary => status_str.dimmed(),
        BadgeVariant::Success => status_str.green(),
        BadgeVariant::Info => status_str.blue(),
        BadgeVariant::Warning => status_str.yellow(),
        BadgeVariant::Destructive => status_str.red(),
    }
}
