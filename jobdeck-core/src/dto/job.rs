//! Job DTOs for the scheduling service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::job::HttpRequest;

/// Request to create a job, also used as the body of an update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJob {
    /// Client-chosen id; the service generates one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub request: HttpRequest,
    pub trigger: TriggerSpec,
}

/// Update payload; same shape as creation, the id travels in the path
pub type UpdateJob = CreateJob;

/// Trigger as requested by the dashboard
///
/// Exactly one of `delay`, `date` or `cron` is ever sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerSpec {
    /// Run once, this many seconds after creation
    Delay {
        #[serde(serialize_with = "serialize_delay")]
        delay: f64,
    },
    /// Run once, at this instant
    Date { date: DateTime<Utc> },
    /// Run on every match of a five-field cron expression
    Cron { cron: String },
}

impl TriggerSpec {
    pub fn delay(&self) -> Option<f64> {
        match self {
            TriggerSpec::Delay { delay } => Some(*delay),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        match self {
            TriggerSpec::Date { date } => Some(*date),
            _ => None,
        }
    }

    pub fn cron(&self) -> Option<&str> {
        match self {
            TriggerSpec::Cron { cron } => Some(cron),
            _ => None,
        }
    }
}

/// Whole-second delays go out as JSON integers
fn serialize_delay<S: Serializer>(delay: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if delay.fract() == 0.0 && delay.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*delay as i64)
    } else {
        serializer.serialize_f64(*delay)
    }
}
