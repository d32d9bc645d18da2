//! Job form validation
//!
//! Form state is kept as the raw text an operator typed. Building a request
//! applies the field rules and the cross-field trigger rules; when they all
//! hold the form becomes a [`CreateJob`] payload, otherwise every failure is
//! reported against the field it belongs to and nothing is sent.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::domain::job::{CronFields, HttpMethod, HttpRequest, Job, Trigger, TriggerKind};
use crate::dto::job::{CreateJob, TriggerSpec};
use crate::error::{Error, Result};

pub const MSG_INVALID_URL: &str = "Invalid url";
pub const MSG_INVALID_NUMBER: &str = "Invalid Number";
pub const MSG_NOT_POSITIVE: &str = "Number must be greater than 0";
pub const MSG_DELAY_OR_DATE: &str = "You must provide either a delay or a run date.";
pub const MSG_INVALID_CRON: &str =
    "Invalid cron expression. You can check https://crontab.guru/ for help";
pub const MSG_INVALID_JSON: &str = "Invalid JSON";
pub const MSG_HEADERS_NOT_OBJECT: &str = "Headers must be a JSON object";
pub const MSG_RUN_DATE_SKIPPED: &str = "Run date does not exist in the local time zone";

/// Input accepted for a run date, most specific first
const RUN_DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Fields of the job form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Id,
    Name,
    Url,
    Method,
    Headers,
    Body,
    TriggerKind,
    Delay,
    RunDate,
    CronExpression,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Id => "id",
            FormField::Name => "name",
            FormField::Url => "url",
            FormField::Method => "method",
            FormField::Headers => "headers",
            FormField::Body => "body",
            FormField::TriggerKind => "trigger",
            FormField::Delay => "delay",
            FormField::RunDate => "run date",
            FormField::CronExpression => "cron expression",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed rule, attached to the field it is shown on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// Every rule a form failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn push(&mut self, field: FormField, message: &str) {
        self.errors.push(FieldError {
            field,
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// First message attached to `field`
    pub fn message_for(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has(&self, field: FormField) -> bool {
        self.message_for(field).is_some()
    }
}

/// Whether the form creates a job or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    /// The id is fixed to the edited job's
    Edit { job_id: String },
}

/// Editable state of the create/update dialog
#[derive(Debug, Clone, PartialEq)]
pub struct JobForm {
    pub id: String,
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    pub headers: String,
    pub body: String,
    pub trigger_kind: TriggerKind,
    pub delay: String,
    /// Wall-clock date and time as picked, in the operator's zone
    pub run_date: Option<NaiveDateTime>,
    pub cron_expression: String,
    mode: FormMode,
}

impl Default for JobForm {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            url: String::new(),
            method: HttpMethod::default(),
            headers: String::new(),
            body: String::new(),
            trigger_kind: TriggerKind::OneTime,
            delay: String::new(),
            run_date: None,
            cron_expression: String::new(),
            mode: FormMode::Create,
        }
    }
}

impl JobForm {
    /// Empty form for a new job
    pub fn new() -> Self {
        Self::default()
    }

    /// Form seeded from an existing job, run date shown in the local zone
    pub fn edit(job: &Job) -> Self {
        Self::edit_in(job, &Local)
    }

    /// Form seeded from an existing job, run date shown in `tz`
    pub fn edit_in<Tz: TimeZone>(job: &Job, tz: &Tz) -> Self {
        let (run_date, cron_expression) = match &job.trigger {
            Trigger::OneTime(fields) => (
                fields.date.map(|date| date.with_timezone(tz).naive_local()),
                String::new(),
            ),
            Trigger::Cron(fields) => (None, fields.expression()),
        };

        Self {
            id: job.id.clone(),
            name: job.name.clone().unwrap_or_default(),
            url: job.request.url.clone(),
            method: job.request.method,
            headers: job
                .request
                .headers
                .as_ref()
                .map(|headers| Value::Object(headers.clone()).to_string())
                .unwrap_or_default(),
            body: job
                .request
                .body
                .as_ref()
                .filter(|body| !body.is_null())
                .map(Value::to_string)
                .unwrap_or_default(),
            trigger_kind: job.trigger.kind(),
            delay: String::new(),
            run_date,
            cron_expression,
            mode: FormMode::Edit {
                job_id: job.id.clone(),
            },
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Whether the id field is read-only
    pub fn is_id_locked(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    /// Check every rule without building the payload
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.build_request().map(|_| ())
    }

    /// Build the payload, reading the run date in the local zone
    pub fn build_request(&self) -> std::result::Result<CreateJob, ValidationErrors> {
        self.build_request_in(&Local)
    }

    /// Build the payload, reading the run date as wall-clock time in `tz`
    ///
    /// | form state                   | payload                            |
    /// |------------------------------|------------------------------------|
    /// | id blank, or editing         | `id` omitted                       |
    /// | id set while creating        | `id` = trimmed id                  |
    /// | name blank / set             | `name` omitted / trimmed name      |
    /// | headers blank / set          | `request.headers` null / object    |
    /// | body blank / set             | `request.body` null / parsed JSON  |
    /// | one-time with delay          | `trigger` = `{delay}`              |
    /// | one-time with run date       | `trigger` = `{date}` (absolute)    |
    /// | cron                         | `trigger` = `{cron}` (5 fields)    |
    pub fn build_request_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
    ) -> std::result::Result<CreateJob, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if Url::parse(self.url.trim()).is_err() {
            errors.push(FormField::Url, MSG_INVALID_URL);
        }

        let headers = match parse_json_field(&self.headers) {
            Ok(None) => None,
            Ok(Some(Value::Object(map))) => Some(map),
            Ok(Some(_)) => {
                errors.push(FormField::Headers, MSG_HEADERS_NOT_OBJECT);
                None
            }
            Err(message) => {
                errors.push(FormField::Headers, message);
                None
            }
        };

        let body = parse_json_field(&self.body).unwrap_or_else(|message| {
            errors.push(FormField::Body, message);
            None
        });

        let delay = parse_delay(&self.delay).unwrap_or_else(|message| {
            errors.push(FormField::Delay, message);
            None
        });

        let trigger = match self.trigger_kind {
            TriggerKind::OneTime => self.one_time_trigger(delay, tz, &mut errors),
            TriggerKind::Cron => match CronFields::parse(&self.cron_expression) {
                Ok(fields) => Some(TriggerSpec::Cron {
                    cron: fields.expression(),
                }),
                Err(_) => {
                    errors.push(FormField::CronExpression, MSG_INVALID_CRON);
                    None
                }
            },
        };

        match trigger {
            Some(trigger) if errors.is_empty() => Ok(CreateJob {
                id: match self.mode {
                    FormMode::Create => non_blank(&self.id),
                    FormMode::Edit { .. } => None,
                },
                name: non_blank(&self.name),
                request: HttpRequest {
                    url: self.url.trim().to_string(),
                    method: self.method,
                    headers,
                    body,
                },
                trigger,
            }),
            _ => Err(errors),
        }
    }

    /// Exactly one of delay and run date
    fn one_time_trigger<Tz: TimeZone>(
        &self,
        delay: Option<f64>,
        tz: &Tz,
        errors: &mut ValidationErrors,
    ) -> Option<TriggerSpec> {
        let has_delay = !self.delay.trim().is_empty();
        if has_delay == self.run_date.is_some() {
            errors.push(FormField::Delay, MSG_DELAY_OR_DATE);
            return None;
        }

        if let Some(run_date) = self.run_date {
            return match local_to_instant(&run_date, tz) {
                Some(date) => Some(TriggerSpec::Date { date }),
                None => {
                    errors.push(FormField::RunDate, MSG_RUN_DATE_SKIPPED);
                    None
                }
            };
        }

        delay.map(|delay| TriggerSpec::Delay { delay })
    }
}

/// Instant at which the wall clock in `tz` reads `local`
///
/// Picks the earlier instant when the wall-clock time repeats, and yields
/// nothing when it is skipped by a forward offset change.
pub fn local_to_instant<Tz: TimeZone>(local: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a run date typed as `YYYY-MM-DD HH:MM[:SS]` (a `T` separator also works)
pub fn parse_run_date(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    RUN_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| {
            Error::InvalidInstant(format!(
                "'{}': expected YYYY-MM-DD HH:MM[:SS] in local time",
                input
            ))
        })
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_json_field(text: &str) -> std::result::Result<Option<Value>, &'static str> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|_| MSG_INVALID_JSON)
}

fn parse_delay(text: &str) -> std::result::Result<Option<f64>, &'static str> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let delay: f64 = text.parse().map_err(|_| MSG_INVALID_NUMBER)?;
    if !delay.is_finite() {
        return Err(MSG_INVALID_NUMBER);
    }
    if delay <= 0.0 {
        return Err(MSG_NOT_POSITIVE);
    }

    Ok(Some(delay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{JobStatus, OneTimeFields};
    use chrono::{FixedOffset, NaiveDate};
    use serde_json::json;

    fn valid_one_time() -> JobForm {
        JobForm {
            url: "https://x.test".to_string(),
            delay: "5".to_string(),
            ..JobForm::new()
        }
    }

    fn run_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn errors_of(form: &JobForm) -> ValidationErrors {
        form.build_request_in(&utc()).unwrap_err()
    }

    #[test]
    fn test_delay_scenario() {
        let payload = valid_one_time().build_request_in(&utc()).unwrap();

        assert_eq!(payload.trigger, TriggerSpec::Delay { delay: 5.0 });
        assert_eq!(payload.trigger.date(), None);
        assert_eq!(payload.trigger.cron(), None);
        assert_eq!(payload.request.url, "https://x.test");
        assert_eq!(payload.request.method, HttpMethod::Get);
        assert_eq!(payload.request.headers, None);
        assert_eq!(payload.request.body, None);
        assert_eq!(payload.id, None);
        assert_eq!(payload.name, None);
    }

    #[test]
    fn test_cron_scenario() {
        let form = JobForm {
            url: "https://x.test".to_string(),
            trigger_kind: TriggerKind::Cron,
            cron_expression: "0 9 * * 1".to_string(),
            ..JobForm::new()
        };

        let payload = form.build_request_in(&utc()).unwrap();
        assert_eq!(
            payload.trigger,
            TriggerSpec::Cron {
                cron: "0 9 * * 1".to_string()
            }
        );
    }

    #[test]
    fn test_one_time_requires_exactly_one_of_delay_and_date() {
        let neither = JobForm {
            delay: String::new(),
            ..valid_one_time()
        };
        assert_eq!(
            errors_of(&neither).message_for(FormField::Delay),
            Some(MSG_DELAY_OR_DATE)
        );

        let both = JobForm {
            run_date: Some(run_date()),
            ..valid_one_time()
        };
        assert_eq!(
            errors_of(&both).message_for(FormField::Delay),
            Some(MSG_DELAY_OR_DATE)
        );

        let date_only = JobForm {
            delay: String::new(),
            run_date: Some(run_date()),
            ..valid_one_time()
        };
        assert!(date_only.build_request_in(&utc()).is_ok());
        assert!(valid_one_time().build_request_in(&utc()).is_ok());
    }

    #[test]
    fn test_delay_must_be_positive_number() {
        for (delay, message) in [
            ("0", MSG_NOT_POSITIVE),
            ("-5", MSG_NOT_POSITIVE),
            ("abc", MSG_INVALID_NUMBER),
            ("inf", MSG_INVALID_NUMBER),
        ] {
            let form = JobForm {
                delay: delay.to_string(),
                ..valid_one_time()
            };
            assert_eq!(
                errors_of(&form).message_for(FormField::Delay),
                Some(message),
                "delay {:?}",
                delay
            );
        }

        let form = JobForm {
            delay: "3".to_string(),
            ..valid_one_time()
        };
        assert_eq!(
            form.build_request_in(&utc()).unwrap().trigger,
            TriggerSpec::Delay { delay: 3.0 }
        );
    }

    #[test]
    fn test_cron_requires_five_fields() {
        let mut form = JobForm {
            trigger_kind: TriggerKind::Cron,
            delay: String::new(),
            ..valid_one_time()
        };

        for expression in ["", "* * * *", "* * * * * *"] {
            form.cron_expression = expression.to_string();
            assert_eq!(
                errors_of(&form).message_for(FormField::CronExpression),
                Some(MSG_INVALID_CRON)
            );
        }

        form.cron_expression = "* * * * *".to_string();
        assert!(form.build_request_in(&utc()).is_ok());

        // Per-field syntax is the service's business
        form.cron_expression = "99 x * * *".to_string();
        assert!(form.build_request_in(&utc()).is_ok());
    }

    #[test]
    fn test_headers_and_body_must_be_json() {
        let form = JobForm {
            headers: "{invalid json".to_string(),
            body: "[1, 2".to_string(),
            ..valid_one_time()
        };
        let errors = errors_of(&form);
        assert_eq!(errors.message_for(FormField::Headers), Some(MSG_INVALID_JSON));
        assert_eq!(errors.message_for(FormField::Body), Some(MSG_INVALID_JSON));

        let form = JobForm {
            headers: "[]".to_string(),
            ..valid_one_time()
        };
        assert_eq!(
            errors_of(&form).message_for(FormField::Headers),
            Some(MSG_HEADERS_NOT_OBJECT)
        );

        let form = JobForm {
            headers: "{}".to_string(),
            ..valid_one_time()
        };
        let payload = form.build_request_in(&utc()).unwrap();
        assert_eq!(payload.request.headers, Some(serde_json::Map::new()));

        let form = JobForm {
            headers: r#"{"Authorization": "Bearer t"}"#.to_string(),
            body: r#"{"ping": true}"#.to_string(),
            ..valid_one_time()
        };
        let payload = form.build_request_in(&utc()).unwrap();
        assert_eq!(
            payload.request.headers.unwrap()["Authorization"],
            json!("Bearer t")
        );
        assert_eq!(payload.request.body, Some(json!({ "ping": true })));
    }

    #[test]
    fn test_url_is_required() {
        let form = JobForm {
            url: "not a url".to_string(),
            ..valid_one_time()
        };
        assert_eq!(errors_of(&form).message_for(FormField::Url), Some(MSG_INVALID_URL));

        let form = JobForm {
            url: String::new(),
            ..valid_one_time()
        };
        assert!(errors_of(&form).has(FormField::Url));
    }

    #[test]
    fn test_all_failures_reported_together() {
        let form = JobForm {
            url: String::new(),
            headers: "{".to_string(),
            delay: "abc".to_string(),
            ..JobForm::new()
        };
        let errors = errors_of(&form);
        assert!(errors.has(FormField::Url));
        assert!(errors.has(FormField::Headers));
        assert!(errors.has(FormField::Delay));
        assert!(errors.to_string().contains("url: Invalid url"));
    }

    #[test]
    fn test_run_date_is_wall_clock_in_zone() {
        let form = JobForm {
            delay: String::new(),
            run_date: Some(run_date()),
            ..valid_one_time()
        };

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let payload = form.build_request_in(&plus_two).unwrap();
        assert_eq!(
            payload.trigger.date().unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap()
        );

        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let payload = form.build_request_in(&minus_five).unwrap();
        assert_eq!(
            payload.trigger.date().unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_run_date_across_dst_transitions() {
        let berlin = chrono_tz::Europe::Berlin;
        let at = |month, day| {
            NaiveDate::from_ymd_opt(2024, month, day)
                .unwrap()
                .and_hms_opt(2, 30, 0)
                .unwrap()
        };

        // Clocks jump from 02:00 to 03:00
        let skipped = JobForm {
            delay: String::new(),
            run_date: Some(at(3, 31)),
            ..valid_one_time()
        };
        let errors = skipped.build_request_in(&berlin).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.message_for(FormField::RunDate),
            Some(MSG_RUN_DATE_SKIPPED)
        );

        // 02:30 happens twice; the first (CEST) one is used
        let repeated = JobForm {
            delay: String::new(),
            run_date: Some(at(10, 27)),
            ..valid_one_time()
        };
        let payload = repeated.build_request_in(&berlin).unwrap();
        assert_eq!(
            payload.trigger.date(),
            Some(Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_id_and_name_trimmed_or_omitted() {
        let form = JobForm {
            id: "  nightly-report ".to_string(),
            name: "   ".to_string(),
            ..valid_one_time()
        };
        let payload = form.build_request_in(&utc()).unwrap();
        assert_eq!(payload.id.as_deref(), Some("nightly-report"));
        assert_eq!(payload.name, None);
    }

    fn existing_job(trigger: Trigger) -> Job {
        Job {
            id: "job-1".to_string(),
            name: Some("Daily Reminder".to_string()),
            status: JobStatus::Active,
            trigger,
            next_run_time: None,
            request: HttpRequest {
                url: "https://x.test/hook".to_string(),
                method: HttpMethod::Post,
                headers: Some(json!({ "X-Key": "a" }).as_object().unwrap().clone()),
                body: Some(json!({ "ping": true })),
            },
            result: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_edit_seeds_from_cron_job() {
        let job = existing_job(Trigger::Cron(CronFields::parse("0 9 * * 1").unwrap()));
        let form = JobForm::edit_in(&job, &utc());

        assert!(form.is_id_locked());
        assert_eq!(form.id, "job-1");
        assert_eq!(form.name, "Daily Reminder");
        assert_eq!(form.method, HttpMethod::Post);
        assert_eq!(form.trigger_kind, TriggerKind::Cron);
        assert_eq!(form.cron_expression, "0 9 * * 1");
        assert_eq!(form.delay, "");
        assert_eq!(form.headers, r#"{"X-Key":"a"}"#);
        assert_eq!(form.body, r#"{"ping":true}"#);

        let payload = form.build_request_in(&utc()).unwrap();
        assert_eq!(payload.id, None);
        assert_eq!(payload.name.as_deref(), Some("Daily Reminder"));
        assert_eq!(payload.request, job.request);
        assert_eq!(payload.trigger.cron(), Some("0 9 * * 1"));
    }

    #[test]
    fn test_edit_seeds_run_date_in_zone() {
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap();
        let job = existing_job(Trigger::OneTime(OneTimeFields { date: Some(date) }));
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let form = JobForm::edit_in(&job, &plus_two);
        assert_eq!(form.trigger_kind, TriggerKind::OneTime);
        assert_eq!(form.run_date, Some(run_date()));

        let payload = form.build_request_in(&plus_two).unwrap();
        assert_eq!(payload.trigger, TriggerSpec::Date { date });
    }

    #[test]
    fn test_parse_run_date() {
        assert_eq!(parse_run_date("2024-06-01 09:30").unwrap(), run_date());
        assert_eq!(parse_run_date("2024-06-01T09:30:00").unwrap(), run_date());
        assert!(parse_run_date("June 1st").is_err());
    }
}
