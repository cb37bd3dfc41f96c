//! ScriptedJobsApi: in-memory JobsApi for tests and dry runs.
//!
//! 応答をキューに積んでおき、呼び出しごとに先頭から返します。
//! キューが空になったら default の応答を返します（無ければエラー）。

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{JobId, ProjectId};
use crate::error::ApiError;
use crate::ports::{JobResource, JobsApi, QueryResultsResponse};

/// Cloneable description of an error to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    NotFound,
    Status(u16, String),
    Other(String),
}

impl ApiErrorKind {
    fn to_error(&self, job_id: &JobId) -> ApiError {
        match self {
            ApiErrorKind::NotFound => ApiError::NotFound(format!("job {job_id}")),
            ApiErrorKind::Status(status, message) => ApiError::Status {
                status: *status,
                message: message.clone(),
            },
            ApiErrorKind::Other(message) => ApiError::Other(message.clone()),
        }
    }
}

/// One recorded `jobs_query_results` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResultsCall {
    pub job_id: JobId,
    pub project_id: ProjectId,
    pub page_size: u32,
    pub timeout_ms: u64,
}

#[derive(Default)]
struct Script {
    jobs: VecDeque<Result<JobResource, ApiErrorKind>>,
    default_job: Option<JobResource>,
    polls: VecDeque<Result<QueryResultsResponse, ApiErrorKind>>,
    default_poll: Option<QueryResultsResponse>,

    jobs_get_calls: usize,
    query_results_calls: Vec<QueryResultsCall>,
}

/// In-memory `JobsApi` that replays scripted responses.
#[derive(Default)]
pub struct ScriptedJobsApi {
    script: Mutex<Script>,
    hold_incomplete_polls: bool,
}

impl ScriptedJobsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make incomplete polls sleep for their full `timeout_ms`, the way the
    /// real service holds the request open. Pair with a paused tokio clock.
    pub fn holding_incomplete_polls(mut self) -> Self {
        self.hold_incomplete_polls = true;
        self
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the script from the others.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_job(&self, resource: JobResource) {
        self.script().jobs.push_back(Ok(resource));
    }

    pub fn push_job_error(&self, kind: ApiErrorKind) {
        self.script().jobs.push_back(Err(kind));
    }

    pub fn set_default_job(&self, resource: JobResource) {
        self.script().default_job = Some(resource);
    }

    pub fn push_poll(&self, response: QueryResultsResponse) {
        self.script().polls.push_back(Ok(response));
    }

    pub fn push_poll_error(&self, kind: ApiErrorKind) {
        self.script().polls.push_back(Err(kind));
    }

    pub fn set_default_poll(&self, response: QueryResultsResponse) {
        self.script().default_poll = Some(response);
    }

    pub fn jobs_get_calls(&self) -> usize {
        self.script().jobs_get_calls
    }

    pub fn query_results_calls(&self) -> Vec<QueryResultsCall> {
        self.script().query_results_calls.clone()
    }
}

#[async_trait]
impl JobsApi for ScriptedJobsApi {
    async fn jobs_get(
        &self,
        job_id: &JobId,
        _project_id: Option<&ProjectId>,
    ) -> Result<JobResource, ApiError> {
        let mut script = self.script();
        script.jobs_get_calls += 1;

        match script.jobs.pop_front() {
            Some(Ok(resource)) => Ok(resource),
            Some(Err(kind)) => Err(kind.to_error(job_id)),
            None => script
                .default_job
                .clone()
                .ok_or_else(|| ApiError::Other("no scripted job resource".to_string())),
        }
    }

    async fn jobs_query_results(
        &self,
        job_id: &JobId,
        project_id: &ProjectId,
        page_size: u32,
        timeout_ms: u64,
    ) -> Result<QueryResultsResponse, ApiError> {
        // Lock scope ends before any await.
        let next = {
            let mut script = self.script();
            script.query_results_calls.push(QueryResultsCall {
                job_id: job_id.clone(),
                project_id: project_id.clone(),
                page_size,
                timeout_ms,
            });

            match script.polls.pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(kind)) => Err(kind.to_error(job_id)),
                None => script
                    .default_poll
                    .clone()
                    .ok_or_else(|| ApiError::Other("no scripted poll response".to_string())),
            }
        };

        if let Ok(response) = &next
            && !response.job_complete
            && self.hold_incomplete_polls
        {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
        }
        next
    }
}
