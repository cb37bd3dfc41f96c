//! HttpJobsApi: JobsApi over the REST v2 endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::domain::{JobId, ProjectId};
use crate::error::{ApiError, BqError};
use crate::ports::{JobResource, JobsApi, QueryResultsResponse};

/// Error envelope the service returns with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// REST client for the jobs API.
///
/// The bearer token is passed through as-is; obtaining and refreshing it is
/// the caller's business.
#[derive(Debug, Clone)]
pub struct HttpJobsApi {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    default_project: Option<ProjectId>,
}

impl HttpJobsApi {
    pub fn new(config: &ClientConfig) -> Result<Self, BqError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            default_project: config.default_project.clone(),
        })
    }

    fn job_url(&self, project: &ProjectId, job_id: &JobId) -> String {
        format!("{}/projects/{}/jobs/{}", self.base_url, project, job_id)
    }

    fn query_results_url(&self, project: &ProjectId, job_id: &JobId) -> String {
        format!("{}/projects/{}/queries/{}", self.base_url, project, job_id)
    }

    fn resolve_project<'a>(
        &'a self,
        project_id: Option<&'a ProjectId>,
    ) -> Result<&'a ProjectId, ApiError> {
        project_id
            .or(self.default_project.as_ref())
            .ok_or_else(|| ApiError::Other("no project id given and no default project".into()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = self.authorize(request).send().await?;
        let response = check_status(response, what).await?;
        let body = response.text().await?;
        trace!(%what, %body, "response body");
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(what.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pull `error.message` out of an error body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl JobsApi for HttpJobsApi {
    async fn jobs_get(
        &self,
        job_id: &JobId,
        project_id: Option<&ProjectId>,
    ) -> Result<JobResource, ApiError> {
        let project = self.resolve_project(project_id)?;
        let url = self.job_url(project, job_id);
        debug!(%url, "jobs.get");

        self.send(self.client.get(&url), &format!("job {job_id}"))
            .await
    }

    async fn jobs_query_results(
        &self,
        job_id: &JobId,
        project_id: &ProjectId,
        page_size: u32,
        timeout_ms: u64,
    ) -> Result<QueryResultsResponse, ApiError> {
        let url = self.query_results_url(project_id, job_id);
        debug!(%url, page_size, timeout_ms, "jobs.getQueryResults");

        let request = self.client.get(&url).query(&[
            ("maxResults", page_size.to_string()),
            ("timeoutMs", timeout_ms.to_string()),
        ]);
        self.send(request, &format!("query results for job {job_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpJobsApi {
        let config = ClientConfig {
            api_base_url: "https://example.test/bigquery/v2/".to_string(),
            default_project: Some(ProjectId::new("fallback")),
            ..ClientConfig::default()
        };
        HttpJobsApi::new(&config).unwrap()
    }

    #[test]
    fn urls_follow_rest_layout() {
        let api = api();
        let job = JobId::new("job_1").unwrap();
        let project = ProjectId::new("p");

        assert_eq!(
            api.job_url(&project, &job),
            "https://example.test/bigquery/v2/projects/p/jobs/job_1"
        );
        assert_eq!(
            api.query_results_url(&project, &job),
            "https://example.test/bigquery/v2/projects/p/queries/job_1"
        );
    }

    #[test]
    fn project_falls_back_to_default() {
        let api = api();
        let explicit = ProjectId::new("p");
        assert_eq!(api.resolve_project(Some(&explicit)).unwrap(), &explicit);
        assert_eq!(api.resolve_project(None).unwrap().as_str(), "fallback");
    }

    #[test]
    fn error_message_prefers_envelope() {
        let body = r#"{"error":{"code":400,"message":"Invalid job id","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "Invalid job id");
        assert_eq!(error_message(" gateway timeout \n"), "gateway timeout");
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ClientConfig {
            api_base_url: String::new(),
            ..ClientConfig::default()
        };
        assert!(matches!(HttpJobsApi::new(&config), Err(BqError::Config(_))));
    }

    /// One-shot HTTP stub on localhost.
    ///
    /// Serves a single canned response and hands back the request head it saw.
    struct StubServer {
        base_url: String,
        request: tokio::task::JoinHandle<String>,
    }

    impl StubServer {
        async fn start(status_line: &str, body: &str) -> Self {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );

            let request = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
                String::from_utf8_lossy(&head).into_owned()
            });

            Self {
                base_url: format!("http://{addr}/bigquery/v2"),
                request,
            }
        }

        fn api(&self, access_token: Option<&str>) -> HttpJobsApi {
            let config = ClientConfig {
                api_base_url: self.base_url.clone(),
                access_token: access_token.map(str::to_string),
                ..ClientConfig::default()
            };
            HttpJobsApi::new(&config).unwrap()
        }

        async fn request_head(self) -> String {
            self.request.await.unwrap()
        }
    }

    fn job_id() -> JobId {
        JobId::new("j1").unwrap()
    }

    #[tokio::test]
    async fn status_poll_sends_zero_page_size_and_server_wait() {
        let server = StubServer::start("200 OK", r#"{"jobComplete":true}"#).await;
        let api = server.api(Some("tok"));

        let response = api
            .jobs_query_results(&job_id(), &ProjectId::new("p"), 0, 30_000)
            .await
            .unwrap();
        assert!(response.job_complete);

        let head = server.request_head().await;
        assert!(
            head.starts_with(
                "GET /bigquery/v2/projects/p/queries/j1?maxResults=0&timeoutMs=30000 HTTP/1.1\r\n"
            ),
            "unexpected request: {head}"
        );
        assert!(head.to_ascii_lowercase().contains("\r\nauthorization: bearer tok\r\n"));
    }

    #[tokio::test]
    async fn jobs_get_decodes_status_without_auth_header() {
        let body = r#"{"jobReference":{"projectId":"p","jobId":"j1"},"status":{"state":"DONE"}}"#;
        let server = StubServer::start("200 OK", body).await;
        let api = server.api(None);

        let resource = api
            .jobs_get(&job_id(), Some(&ProjectId::new("p")))
            .await
            .unwrap();
        assert!(resource.status.unwrap().state.is_terminal());

        let head = server.request_head().await;
        assert!(head.starts_with("GET /bigquery/v2/projects/p/jobs/j1 HTTP/1.1\r\n"));
        assert!(!head.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn not_found_maps_to_not_found() {
        let body = r#"{"error":{"message":"Not found: Job p:j1"}}"#;
        let server = StubServer::start("404 Not Found", body).await;
        let api = server.api(None);

        let err = api
            .jobs_get(&job_id(), Some(&ProjectId::new("p")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        server.request_head().await;
    }

    #[tokio::test]
    async fn error_status_carries_envelope_message() {
        let body = r#"{"error":{"message":"Invalid job"}}"#;
        let server = StubServer::start("400 Bad Request", body).await;
        let api = server.api(None);

        let err = api
            .jobs_query_results(&job_id(), &ProjectId::new("p"), 0, 30_000)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 400, .. }));
        assert_eq!(err.to_string(), "API error (status 400): Invalid job");
        server.request_head().await;
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = StubServer::start("200 OK", "not json").await;
        let api = server.api(None);

        let err = api
            .jobs_query_results(&job_id(), &ProjectId::new("p"), 0, 1_000)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        server.request_head().await;
    }
}
