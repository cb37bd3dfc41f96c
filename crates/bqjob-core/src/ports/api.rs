//! JobsApi port - リモートのクエリサービスへの窓口
//!
//! ジョブの状態取得と、クエリ結果のポーリングの 2 つだけを扱います。
//! 認証・ページング・行の読み出しはこの trait の外側の責務です。
//!
//! # 実装
//! - **HttpJobsApi**: REST v2 over reqwest（本番用）
//! - **ScriptedJobsApi**: 応答を台本どおりに返す（テスト・dry-run 用）

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{JobId, JobStatus, ProjectId};
use crate::error::ApiError;

/// `jobReference` as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: ProjectId,
    pub job_id: JobId,
}

/// Response body of `jobs.get`. Only the fields the job proxy reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

/// Response body of `jobs.getQueryResults`.
///
/// With `maxResults=0` the service returns no rows, just the completion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultsResponse {
    #[serde(default)]
    pub job_complete: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,

    /// int64 values are strings on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<String>,
}

impl QueryResultsResponse {
    pub fn pending() -> Self {
        Self {
            job_complete: false,
            job_reference: None,
            total_rows: None,
        }
    }

    pub fn complete() -> Self {
        Self {
            job_complete: true,
            ..Self::pending()
        }
    }
}

/// Client seam over the remote jobs API.
///
/// # Thread Safety
/// - `Send + Sync` を要求（`Arc<dyn JobsApi>` で共有する）
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// `GET projects/{project}/jobs/{job_id}`
    async fn jobs_get(
        &self,
        job_id: &JobId,
        project_id: Option<&ProjectId>,
    ) -> Result<JobResource, ApiError>;

    /// `GET projects/{project}/queries/{job_id}`
    ///
    /// `timeout_ms` is how long the server may hold the request open waiting
    /// for the job to finish.
    async fn jobs_query_results(
        &self,
        job_id: &JobId,
        project_id: &ProjectId,
        page_size: u32,
        timeout_ms: u64,
    ) -> Result<QueryResultsResponse, ApiError>;
}
