//! Form submission
//!
//! One submission per form at a time: a second attempt while the first is in
//! flight is refused locally. Validation failures never reach the service.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, TimeZone};
use jobdeck_core::domain::job::Job;
use jobdeck_core::form::{FormMode, JobForm, ValidationErrors};
use thiserror::Error;
use tracing::{debug, error};

use crate::error::ClientError;
use crate::service::JobService;

/// Why a submission produced no job
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Another submission from the same form is still in flight
    #[error("a submission is already in progress")]
    Busy,

    /// The form failed validation; nothing was sent
    #[error("invalid job: {0}")]
    Invalid(#[from] ValidationErrors),

    /// The service rejected the request or could not be reached
    #[error(transparent)]
    Remote(#[from] ClientError),
}

/// Busy flag for a form's submit action
#[derive(Debug, Default)]
pub struct SubmitGuard {
    busy: AtomicBool,
}

/// Holds the busy flag until dropped
struct InFlight<'a> {
    busy: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submission is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<InFlight<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight { busy: &self.busy })
    }

    /// Validate and send `form`, reading its run date in the local zone
    pub async fn submit<S>(&self, service: &S, form: &JobForm) -> Result<Job, SubmitError>
    where
        S: JobService + ?Sized,
    {
        self.submit_in(service, form, &Local).await
    }

    /// Validate and send `form`, reading its run date in `tz`
    ///
    /// Creates or updates depending on the form's mode. The busy flag is
    /// released however the call settles.
    ///
    /// # Returns
    /// The job as stored by the service
    pub async fn submit_in<S, Tz>(
        &self,
        service: &S,
        form: &JobForm,
        tz: &Tz,
    ) -> Result<Job, SubmitError>
    where
        S: JobService + ?Sized,
        Tz: TimeZone,
    {
        let Some(_in_flight) = self.acquire() else {
            return Err(SubmitError::Busy);
        };

        let payload = form.build_request_in(tz)?;

        let outcome = match form.mode() {
            FormMode::Create => service.create_job(&payload).await,
            FormMode::Edit { job_id } => service.update_job(job_id, &payload).await,
        };

        match outcome {
            Ok(job) => {
                debug!(job_id = %job.id, "job saved");
                Ok(job)
            }
            Err(e) => {
                error!(error = %e, "failed to save job");
                Err(SubmitError::Remote(e))
            }
        }
    }
}
