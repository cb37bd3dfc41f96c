//! Errors reported by the remote service for a job.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One remote error record (REST `ErrorProto`).
///
/// Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or("unknown error"))?;

        let details: Vec<String> = [("reason", &self.reason), ("location", &self.location)]
            .into_iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}={v}")))
            .collect();
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

/// Render a list of errors the way a failure message carries them.
pub fn format_errors(errors: &[JobError]) -> String {
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_present_details_only() {
        let e = JobError::new("Syntax error").with_reason("invalidQuery");
        assert_eq!(e.to_string(), "Syntax error (reason=invalidQuery)");

        let e = JobError::new("boom");
        assert_eq!(e.to_string(), "boom");

        let e = JobError::default().with_location("query");
        assert_eq!(e.to_string(), "unknown error (location=query)");
    }

    #[test]
    fn format_errors_joins_all() {
        let errors = vec![JobError::new("a"), JobError::new("b").with_reason("r")];
        assert_eq!(format_errors(&errors), "[a; b (reason=r)]");
        assert_eq!(format_errors(&[]), "[]");
    }
}
