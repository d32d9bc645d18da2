//! Job collection view
//!
//! Filtering, sorting and selection over fetched job collections. Nothing
//! here holds on to jobs: callers pass the collections they last fetched.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::job::{Job, JobStatus, TriggerKind};

/// Faceted filter plus free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// Trigger kinds to keep; empty keeps all
    pub kinds: Vec<TriggerKind>,
    /// Statuses to keep; empty keeps all
    pub statuses: Vec<JobStatus>,
    /// Case-insensitive text looked up in id, name, url, method, status and type
    pub search: Option<String>,
}

impl JobFilter {
    /// Whether any facet or search is active
    pub fn is_filtered(&self) -> bool {
        !self.kinds.is_empty()
            || !self.statuses.is_empty()
            || self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn matches(&self, job: &Job) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&job.trigger.kind()) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&job.status) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                searchable_text(job)
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }

    /// Jobs passing the filter, in their original order
    pub fn apply<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        jobs.iter().filter(|job| self.matches(job)).collect()
    }
}

fn searchable_text(job: &Job) -> [&str; 7] {
    [
        job.id.as_str(),
        job.name.as_deref().unwrap_or_default(),
        job.request.url.as_str(),
        job.request.method.as_str(),
        job.status.as_str(),
        job.trigger.kind().as_str(),
        job.trigger.kind().label(),
    ]
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Scheduled jobs by next run time; jobs without one go last either way
///
/// Ascending puts the soonest run first.
pub fn sort_scheduled(jobs: &mut [&Job], order: SortOrder) {
    jobs.sort_by(|a, b| compare_optional(a.next_run_time, b.next_run_time, order));
}

/// Completed jobs by completion time; jobs without one go last either way
///
/// Descending puts the most recent completion first.
pub fn sort_completed(jobs: &mut [&Job], order: SortOrder) {
    jobs.sort_by(|a, b| compare_optional(a.completed_at(), b.completed_at(), order));
}

fn compare_optional(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    order: SortOrder,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Ascending => a.cmp(&b),
            SortOrder::Descending => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A selected row
///
/// The same id can complete several times, so completed rows also carry
/// their completion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Selection {
    pub fn of(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            completed_at: job.completed_at(),
        }
    }

    pub fn is_of(&self, job: &Job) -> bool {
        self.id == job.id && self.completed_at == job.completed_at()
    }

    /// Selection after clicking `job`: clicking the selected row clears it
    pub fn toggle(current: Option<&Selection>, job: &Job) -> Option<Selection> {
        match current {
            Some(selection) if selection.is_of(job) => None,
            _ => Some(Selection::of(job)),
        }
    }

    /// Find the selected job in the latest collections
    ///
    /// Live jobs are matched by id; completed jobs by id and completion
    /// time. `None` means the job is gone (deleted, or not yet refetched).
    pub fn resolve<'a>(&self, active: &'a [Job], completed: &'a [Job]) -> Option<&'a Job> {
        active
            .iter()
            .find(|job| job.id == self.id)
            .or_else(|| completed.iter().find(|job| self.is_of(job)))
    }
}
