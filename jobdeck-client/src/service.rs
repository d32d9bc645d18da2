//! The scheduling service as seen by the dashboard

use async_trait::async_trait;
use jobdeck_core::domain::job::Job;
use jobdeck_core::dto::job::{CreateJob, UpdateJob};

use crate::SchedulerClient;
use crate::error::Result;

/// Remote job operations
///
/// Implemented over HTTP by [`SchedulerClient`]; tests substitute their own.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn list_completed_jobs(&self) -> Result<Vec<Job>>;

    async fn create_job(&self, req: &CreateJob) -> Result<Job>;

    async fn update_job(&self, job_id: &str, req: &UpdateJob) -> Result<Job>;

    async fn pause_job(&self, job_id: &str) -> Result<()>;

    async fn resume_job(&self, job_id: &str) -> Result<()>;

    async fn remove_job(&self, job_id: &str) -> Result<()>;
}

#[async_trait]
impl JobService for SchedulerClient {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        SchedulerClient::list_jobs(self).await
    }

    async fn list_completed_jobs(&self) -> Result<Vec<Job>> {
        SchedulerClient::list_completed_jobs(self).await
    }

    async fn create_job(&self, req: &CreateJob) -> Result<Job> {
        SchedulerClient::create_job(self, req).await
    }

    async fn update_job(&self, job_id: &str, req: &UpdateJob) -> Result<Job> {
        SchedulerClient::update_job(self, job_id, req).await
    }

    async fn pause_job(&self, job_id: &str) -> Result<()> {
        SchedulerClient::pause_job(self, job_id).await
    }

    async fn resume_job(&self, job_id: &str) -> Result<()> {
        SchedulerClient::resume_job(self, job_id).await
    }

    async fn remove_job(&self, job_id: &str) -> Result<()> {
        SchedulerClient::remove_job(self, job_id).await
    }
}
