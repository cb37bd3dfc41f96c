//! State - リモートジョブの状態
//!
//! サーバが返す `status` オブジェクトをそのまま写した型です。

use serde::{Deserialize, Serialize};

use super::errors::JobError;

/// Remote job lifecycle.
///
/// State transitions (server side):
/// - Pending -> Running -> Done
///
/// `Done` says nothing about success; check `JobStatus::error_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done)
    }
}

/// Snapshot of the remote `status` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: JobState,

    /// Set when the job finished unsuccessfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_result: Option<JobError>,

    /// Every error (and warning) the service reported while running the job.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JobError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_uses_rest_names() {
        let s: JobState = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(s, JobState::Done);
        assert!(s.is_terminal());

        let s: JobState = serde_json::from_str("\"RUNNING\"").unwrap();
        assert!(!s.is_terminal());
    }

    #[test]
    fn unknown_state_is_rejected() {
        assert!(serde_json::from_str::<JobState>("\"EXPLODED\"").is_err());
    }

    #[test]
    fn status_decodes_error_result() {
        let v = serde_json::json!({
            "state": "DONE",
            "errorResult": {"reason": "invalidQuery", "message": "Syntax error"},
            "errors": [{"reason": "invalidQuery", "location": "query", "message": "Syntax error"}]
        });
        let status: JobStatus = serde_json::from_value(v).unwrap();
        assert_eq!(status.state, JobState::Done);
        assert_eq!(
            status.error_result.unwrap().message.as_deref(),
            Some("Syntax error")
        );
        assert_eq!(status.errors.len(), 1);
    }
}
