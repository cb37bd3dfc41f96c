//! Client configuration, read from the environment.

use serde::{Deserialize, Serialize};

use crate::domain::ProjectId;
use crate::error::BqError;

pub const DEFAULT_API_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Bearer token sent as-is.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Used when a call carries no project of its own.
    pub default_project: Option<ProjectId>,
    /// Server-side wait per status poll.
    pub poll_slice_secs: u64,
    /// Whole-request timeout; must outlast the server-side wait.
    pub http_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: None,
            default_project: None,
            poll_slice_secs: 30,
            http_timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_base_url: non_empty("BQJOB_API_BASE_URL").unwrap_or(defaults.api_base_url),
            access_token: non_empty("BQJOB_ACCESS_TOKEN"),
            default_project: non_empty("BQJOB_DEFAULT_PROJECT").map(ProjectId::new),
            poll_slice_secs: non_empty("BQJOB_POLL_SLICE_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_slice_secs),
            http_timeout_secs: non_empty("BQJOB_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<(), BqError> {
        if self.api_base_url.trim().is_empty() {
            return Err(BqError::Config("api base url cannot be empty".into()));
        }
        if self.poll_slice_secs == 0 {
            return Err(BqError::Config("poll slice must be at least 1 second".into()));
        }
        if self.http_timeout_secs <= self.poll_slice_secs {
            return Err(BqError::Config(format!(
                "http timeout ({}s) must exceed the poll slice ({}s)",
                self.http_timeout_secs, self.poll_slice_secs
            )));
        }
        Ok(())
    }

    pub fn poll_slice(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_slice_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_slice(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BQJOB_API_BASE_URL", "http://localhost:9050"),
            ("BQJOB_ACCESS_TOKEN", "ya29.token"),
            ("BQJOB_DEFAULT_PROJECT", "proj"),
            ("BQJOB_POLL_SLICE_SECS", "10"),
            ("BQJOB_HTTP_TIMEOUT_SECS", "20"),
        ]));
        assert_eq!(config.api_base_url, "http://localhost:9050");
        assert_eq!(config.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.default_project, Some(ProjectId::new("proj")));
        assert_eq!(config.poll_slice_secs, 10);
        assert_eq!(config.http_timeout_secs, 20);
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[("BQJOB_POLL_SLICE_SECS", "soon")]));
        assert_eq!(config.poll_slice_secs, 30);
    }

    #[test]
    fn http_timeout_must_outlast_slice() {
        let config = ClientConfig {
            poll_slice_secs: 30,
            http_timeout_secs: 30,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(BqError::Config(_))));
    }
}
