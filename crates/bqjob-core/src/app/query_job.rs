//! QueryJob: a query job plus the temporary table it writes into.
//!
//! 汎用の `Job::wait` は sleep してから状態を取りに行きますが、
//! クエリジョブは `getQueryResults` がサーバ側で最大 `poll_slice` だけ
//! 待ってくれるので、sleep なしで完了を待てます。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::domain::{Job, JobId, QueryResultsTable, TableName, format_errors};
use crate::error::BqError;
use crate::ports::{Clock, JobsApi};

/// Server-side wait passed to each status poll.
pub const DEFAULT_POLL_SLICE: Duration = Duration::from_secs(30);

/// A query job submitted earlier, tracked by id.
#[derive(Debug)]
pub struct QueryJob {
    job: Job,
    sql: String,
    table: QueryResultsTable,
    poll_slice: Duration,
}

impl QueryJob {
    /// Track `job_id`, whose results land in the temporary table `table_name`.
    pub fn new(
        api: Arc<dyn JobsApi>,
        job_id: JobId,
        table_name: TableName,
        sql: impl Into<String>,
    ) -> Self {
        let job = Job::new(api, job_id);
        Self::from_job(job, table_name, sql)
    }

    pub fn with_clock(
        api: Arc<dyn JobsApi>,
        job_id: JobId,
        table_name: TableName,
        sql: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let job = Job::with_clock(api, job_id, clock);
        Self::from_job(job, table_name, sql)
    }

    fn from_job(job: Job, table_name: TableName, sql: impl Into<String>) -> Self {
        let job = job.with_project(table_name.project_id.clone());
        let table = QueryResultsTable::new(table_name, job.id().clone(), true);
        Self {
            job,
            sql: sql.into(),
            table,
            poll_slice: DEFAULT_POLL_SLICE,
        }
    }

    /// Override the server-side wait per poll. Zero is clamped to 1ms.
    pub fn with_poll_slice(mut self, slice: Duration) -> Self {
        self.poll_slice = slice.max(Duration::from_millis(1));
        self
    }

    pub fn poll_slice(&self) -> Duration {
        self.poll_slice
    }

    /// The query text, exactly as given.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn id(&self) -> &JobId {
        self.job.id()
    }

    pub fn is_complete(&self) -> bool {
        self.job.is_complete()
    }

    pub fn failed(&self) -> bool {
        self.job.failed()
    }

    /// The result table handle, without waiting.
    ///
    /// Only readable once the job has completed successfully.
    pub fn table(&self) -> &QueryResultsTable {
        &self.table
    }

    /// Wait for the job to complete, or for `timeout` to run out.
    ///
    /// Each poll lets the server hold the request for up to one slice, so
    /// there is no client-side sleep. The budget shrinks by the slice used on
    /// every incomplete poll. Running out of budget is not an error; check
    /// [`QueryJob::is_complete`] afterwards.
    ///
    /// State is refreshed from the remote service on every exit.
    #[instrument(skip(self), fields(job_id = %self.job.id()))]
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<&Self, BqError> {
        let mut remaining = timeout;

        while !self.job.is_complete() {
            let slice = remaining.map_or(self.poll_slice, |r| r.min(self.poll_slice));
            let response = self
                .job
                .api()
                .jobs_query_results(
                    self.job.id(),
                    &self.table.name().project_id,
                    0,
                    u64::try_from(slice.as_millis()).unwrap_or(u64::MAX),
                )
                .await?;

            if response.job_complete {
                debug!("query reported complete");
                break;
            }

            if let Some(r) = remaining {
                let left = r.saturating_sub(slice);
                if left.is_zero() {
                    debug!("wait budget exhausted");
                    break;
                }
                remaining = Some(left);
            }
        }

        self.job.refresh_state().await;
        Ok(self)
    }

    /// Wait (without timeout) for the job, then hand out the result table.
    ///
    /// Fails with the remote error details if the query failed.
    pub async fn results(&mut self) -> Result<&QueryResultsTable, BqError> {
        self.wait(None).await?;

        if self.job.failed() {
            let details = match self.job.fatal_error() {
                Some(fatal) if self.job.errors().is_empty() => {
                    format_errors(std::slice::from_ref(fatal))
                }
                _ => format_errors(self.job.errors()),
            };
            info!(job_id = %self.job.id(), %details, "query failed");
            return Err(BqError::QueryFailed(details));
        }
        Ok(&self.table)
    }
}

impl fmt::Display for QueryJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query{}", self.job)
    }
}
