//! Job API endpoints

use crate::SchedulerClient;
use crate::error::{ClientError, Result};
use jobdeck_core::domain::job::Job;
use jobdeck_core::dto::job::{CreateJob, UpdateJob};
use tracing::debug;

impl SchedulerClient {
    // =============================================================================
    // Collections
    // =============================================================================

    /// List every live job (active, paused or pending)
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        debug!("GET /jobs");
        let response = self.client.get(self.url("/jobs")).send().await?;

        self.handle_response(response).await
    }

    /// List concluded firings
    ///
    /// The same job id shows up once per completion.
    pub async fn list_completed_jobs(&self) -> Result<Vec<Job>> {
        debug!("GET /jobs/completed");
        let response = self.client.get(self.url("/jobs/completed")).send().await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    ///
    /// # Returns
    /// The job, or `ClientError::NotFound` when the service does not know it
    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        debug!(job_id, "GET /jobs/{{id}}");
        let response = self
            .client
            .get(self.url(&format!("/jobs/{}", job_id)))
            .send()
            .await?;

        self.handle_response(response).await.map_err(|e| match e {
            ClientError::Api { status: 404, .. } => ClientError::NotFound(job_id.to_string()),
            other => other,
        })
    }

    // =============================================================================
    // Mutations
    // =============================================================================

    /// Create a job
    ///
    /// # Arguments
    /// * `req` - A payload built by `JobForm::build_request`
    ///
    /// # Returns
    /// The job as stored by the service
    pub async fn create_job(&self, req: &CreateJob) -> Result<Job> {
        debug!(trigger = ?req.trigger, "POST /jobs");
        let response = self.client.post(self.url("/jobs")).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Replace a job's definition
    ///
    /// # Arguments
    /// * `job_id` - The job being edited
    /// * `req` - The new definition; its `id` is ignored
    pub async fn update_job(&self, job_id: &str, req: &UpdateJob) -> Result<Job> {
        debug!(job_id, trigger = ?req.trigger, "PUT /jobs/{{id}}");
        let response = self
            .client
            .put(self.url(&format!("/jobs/{}", job_id)))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Stop a job from firing until resumed
    pub async fn pause_job(&self, job_id: &str) -> Result<()> {
        debug!(job_id, "POST /jobs/{{id}}/pause");
        let response = self
            .client
            .post(self.url(&format!("/jobs/{}/pause", job_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Let a paused job fire again
    pub async fn resume_job(&self, job_id: &str) -> Result<()> {
        debug!(job_id, "POST /jobs/{{id}}/resume");
        let response = self
            .client
            .post(self.url(&format!("/jobs/{}/resume", job_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete a job
    pub async fn remove_job(&self, job_id: &str) -> Result<()> {
        debug!(job_id, "DELETE /jobs/{{id}}");
        let response = self
            .client
            .delete(self.url(&format!("/jobs/{}", job_id)))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
