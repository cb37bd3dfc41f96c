//! Job proxy: local view of a remote job's state.
//!
//! The remote service is the source of truth. This type caches what it has
//! last seen and only moves forward: once complete, it never refreshes again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::errors::JobError;
use super::ids::{JobId, ProjectId};
use super::state::JobState;
use crate::ports::{Clock, JobsApi, SystemClock};

/// Interval between refreshes in the generic [`Job::wait`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to a remote job.
///
/// Design:
/// - State transitions via `refresh_state` (not direct field access)
/// - `complete` is sticky
pub struct Job {
    api: Arc<dyn JobsApi>,
    clock: Arc<dyn Clock>,
    job_id: JobId,
    project_id: Option<ProjectId>,

    complete: bool,
    last_state: Option<JobState>,
    fatal_error: Option<JobError>,
    errors: Vec<JobError>,

    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(api: Arc<dyn JobsApi>, job_id: JobId) -> Self {
        Self::with_clock(api, job_id, Arc::new(SystemClock))
    }

    pub fn with_clock(api: Arc<dyn JobsApi>, job_id: JobId, clock: Arc<dyn Clock>) -> Self {
        let start_time = clock.now();
        Self {
            api,
            clock,
            job_id,
            project_id: None,
            complete: false,
            last_state: None,
            fatal_error: None,
            errors: Vec::new(),
            start_time,
            end_time: None,
        }
    }

    /// Project the job lives in. Without one, the API client's default applies.
    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn id(&self) -> &JobId {
        &self.job_id
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    pub(crate) fn api(&self) -> &Arc<dyn JobsApi> {
        &self.api
    }

    /// Last known remote state, if any refresh has succeeded yet.
    pub fn last_state(&self) -> Option<JobState> {
        self.last_state
    }

    /// Whether the job is known to be finished (successfully or not).
    ///
    /// This reads cached state only; call [`Job::refresh_state`] to update it.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Complete with a fatal error.
    pub fn failed(&self) -> bool {
        self.complete && self.fatal_error.is_some()
    }

    pub fn fatal_error(&self) -> Option<&JobError> {
        self.fatal_error.as_ref()
    }

    pub fn errors(&self) -> &[JobError] {
        &self.errors
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Time from construction until completion was observed.
    pub fn total_time(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    /// Pull the latest state from the remote service.
    ///
    /// A failed lookup completes the job with that failure as its fatal error,
    /// so callers waiting on it do not spin forever.
    pub async fn refresh_state(&mut self) {
        if self.complete {
            return;
        }

        let resource = match self
            .api
            .jobs_get(&self.job_id, self.project_id.as_ref())
            .await
        {
            Ok(resource) => resource,
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "job refresh failed");
                self.fatal_error = Some(JobError::new(e.to_string()));
                self.mark_complete();
                return;
            }
        };

        let Some(status) = resource.status else {
            return;
        };

        self.last_state = Some(status.state);
        if status.state.is_terminal() {
            self.fatal_error = status.error_result;
            self.errors = status.errors;
            self.mark_complete();
            debug!(job_id = %self.job_id, failed = self.failed(), "job finished");
        }
    }

    fn mark_complete(&mut self) {
        self.complete = true;
        self.end_time = Some(self.clock.now());
    }

    /// Refresh repeatedly until the job completes or `timeout` passes.
    ///
    /// Sleeps between refreshes; a timeout is not an error, check
    /// [`Job::is_complete`] afterwards.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> &Self {
        self.wait_with_interval(timeout, DEFAULT_POLL_INTERVAL).await
    }

    pub async fn wait_with_interval(
        &mut self,
        timeout: Option<Duration>,
        interval: Duration,
    ) -> &Self {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);

        self.refresh_state().await;
        while !self.complete {
            if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                debug!(job_id = %self.job_id, "wait timed out");
                break;
            }
            tokio::time::sleep(interval).await;
            self.refresh_state().await;
        }
        self
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("job_id", &self.job_id)
            .field("project_id", &self.project_id)
            .field("complete", &self.complete)
            .field("last_state", &self.last_state)
            .field("fatal_error", &self.fatal_error)
            .field("errors", &self.errors)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .finish()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job {}", self.job_id)?;
        if self.failed() {
            f.write_str(" (failed)")
        } else if self.complete {
            f.write_str(" (complete)")
        } else {
            Ok(())
        }
    }
}
