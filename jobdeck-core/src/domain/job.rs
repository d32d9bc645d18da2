//! Job domain types
//!
//! A job as served by the scheduling service. The dashboard never mutates
//! these in place; every action is a round trip followed by a refetch.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Scheduled HTTP call tracked by the scheduling service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: JobStatus,
    pub trigger: Trigger,
    #[serde(default)]
    pub next_run_time: Option<DateTime<Utc>>,
    pub request: HttpRequest,
    #[serde(default)]
    pub result: Option<JobResult>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Whether the job reached one of the terminal `completed-*` states
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Completion timestamp, once a firing concluded
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.result.as_ref().map(|result| result.completed_at)
    }

    /// Instant a countdown should run towards, if any
    pub fn countdown_target(&self) -> Option<DateTime<Utc>> {
        if self.is_completed() {
            None
        } else {
            self.next_run_time
        }
    }

    /// Name if set, otherwise the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Actions an operator may take on this job
    ///
    /// Completed jobs are read-only. Live jobs can be edited and deleted, and
    /// toggled between paused and running.
    pub fn actions(&self) -> Vec<JobAction> {
        if self.is_completed() {
            return Vec::new();
        }

        let toggle = if self.status == JobStatus::Paused {
            JobAction::Resume
        } else {
            JobAction::Pause
        };

        vec![JobAction::Edit, toggle, JobAction::Delete]
    }
}

/// Whether `job` reached one of the terminal `completed-*` states
pub fn is_completed(job: &Job) -> bool {
    job.is_completed()
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// Accepted, trigger not yet schedulable
    Pending,
    /// Scheduled with a future run
    Active,
    /// Suspended by an operator
    Paused,
    /// Request made and the target answered successfully
    CompletedSuccessful,
    /// Target answered with an erroneous response
    CompletedResponseError,
    /// Request could not be made
    CompletedRequestError,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Active,
        JobStatus::Paused,
        JobStatus::CompletedSuccessful,
        JobStatus::CompletedResponseError,
        JobStatus::CompletedRequestError,
    ];

    /// Statuses offered as filters on the scheduled collection
    pub const LIVE: [JobStatus; 3] = [JobStatus::Active, JobStatus::Paused, JobStatus::Pending];

    /// Statuses offered as filters on the completed collection
    pub const COMPLETED: [JobStatus; 3] = [
        JobStatus::CompletedSuccessful,
        JobStatus::CompletedResponseError,
        JobStatus::CompletedRequestError,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::CompletedSuccessful => "completed-successful",
            JobStatus::CompletedResponseError => "completed-response-error",
            JobStatus::CompletedRequestError => "completed-request-error",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            JobStatus::CompletedSuccessful
                | JobStatus::CompletedResponseError
                | JobStatus::CompletedRequestError
        )
    }

    /// Visual variant of the status badge
    pub fn badge_variant(&self) -> BadgeVariant {
        match self {
            JobStatus::Active => BadgeVariant::Success,
            JobStatus::Paused => BadgeVariant::Info,
            JobStatus::Pending => BadgeVariant::Warning,
            JobStatus::CompletedSuccessful => BadgeVariant::Secondary,
            JobStatus::CompletedResponseError | JobStatus::CompletedRequestError => {
                BadgeVariant::Destructive
            }
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown job status: {}", s))
    }
}

/// Visual variant of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Default,
    Secondary,
    Success,
    Info,
    Warning,
    Destructive,
}

impl BadgeVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeVariant::Default => "default",
            BadgeVariant::Secondary => "secondary",
            BadgeVariant::Success => "success",
            BadgeVariant::Info => "info",
            BadgeVariant::Warning => "warning",
            BadgeVariant::Destructive => "destructive",
        }
    }
}

/// Operator action available on a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Edit,
    Pause,
    Resume,
    Delete,
}

/// Rule determining when a job runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "fields", rename_all = "kebab-case")]
pub enum Trigger {
    /// Fires once, at a date or after a delay from creation
    OneTime(OneTimeFields),
    /// Fires on every match of a cron expression
    Cron(CronFields),
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::OneTime(_) => TriggerKind::OneTime,
            Trigger::Cron(_) => TriggerKind::Cron,
        }
    }

    /// Cron expression, for cron triggers
    pub fn cron_expression(&self) -> Option<String> {
        match self {
            Trigger::Cron(fields) => Some(fields.expression()),
            Trigger::OneTime(_) => None,
        }
    }
}

/// Execution instant of a one-time trigger
///
/// The service resolves delays to a date; `date` is only missing on
/// payloads from services that do not report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeFields {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// The five subexpressions of a cron trigger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CronFields {
    pub minute: String,
    pub hour: String,
    pub day: String,
    pub month: String,
    pub day_of_week: String,
}

impl CronFields {
    /// Split an expression into its five fields
    ///
    /// Only the field count is checked; each field's crontab syntax is left
    /// to the scheduling service.
    pub fn parse(expression: &str) -> Result<Self> {
        let tokens: Vec<&str> = expression.split_whitespace().collect();
        match tokens.as_slice() {
            [minute, hour, day, month, day_of_week] => Ok(Self {
                minute: minute.to_string(),
                hour: hour.to_string(),
                day: day.to_string(),
                month: month.to_string(),
                day_of_week: day_of_week.to_string(),
            }),
            _ => Err(Error::InvalidCron {
                expression: expression.to_string(),
                found: tokens.len(),
            }),
        }
    }

    /// Canonical `"<minute> <hour> <day> <month> <day_of_week>"` form
    pub fn expression(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.minute, self.hour, self.day, self.month, self.day_of_week
        )
    }
}

impl fmt::Display for CronFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}

impl FromStr for CronFields {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Trigger variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    OneTime,
    Cron,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 2] = [TriggerKind::Cron, TriggerKind::OneTime];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::OneTime => "one-time",
            TriggerKind::Cron => "cron",
        }
    }

    /// Badge text
    pub fn label(&self) -> &'static str {
        match self {
            TriggerKind::OneTime => "One Time",
            TriggerKind::Cron => "Cron",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "one-time" => Ok(TriggerKind::OneTime),
            "cron" => Ok(TriggerKind::Cron),
            _ => Err(format!("unknown trigger type: {}", s)),
        }
    }
}

/// HTTP methods accepted by the scheduling service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Update,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Update,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Update => "UPDATE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported HTTP method: {}", s))
    }
}

/// HTTP call a job performs when it fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Option<Map<String, Value>>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// Outcome of a concluded firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub response: Option<JobResponse>,
}

/// Response received from the job's target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: Option<Map<String, Value>>,
    #[serde(default)]
    pub body: Option<Value>,
}
