//! Domain identifiers (strongly-typed IDs).
//!
//! ジョブ ID やプロジェクト ID はサーバ側で採番される不透明な文字列です。
//! 生の `String` を引き回すと取り違えが起きるので、newtype で包みます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BqError;

/// Identifier of a remote job (server-assigned, opaque).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Create a job id. Empty or whitespace-only ids are rejected.
    pub fn new(s: impl Into<String>) -> Result<Self, BqError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(BqError::InvalidJobId);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JobId {
    type Error = BqError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the project that owns a job or table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fully-qualified table name.
///
/// Accepted forms:
/// - `project:dataset.table` (legacy SQL style)
/// - `project.dataset.table` (standard SQL style)
/// - `dataset.table` (only via [`TableName::parse_with_default_project`])
///
/// The project may be domain-scoped (`example.com:proj`) in either form.
///
/// Always displayed as `project:dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub project_id: ProjectId,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableName {
    pub fn new(
        project_id: ProjectId,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }

    /// Parse a table name, falling back to `default_project` when the name
    /// has only `dataset.table`.
    pub fn parse_with_default_project(
        name: &str,
        default_project: Option<&ProjectId>,
    ) -> Result<Self, BqError> {
        let invalid = || BqError::InvalidTableName(name.to_string());

        // Domain-scoped projects (`example.com:proj`) carry a colon of their own.
        let (project, rest) = match name.rsplit_once(':') {
            Some((project, rest)) => (Some(project.to_string()), rest),
            None => (None, name),
        };

        let parts: Vec<&str> = rest.split('.').collect();
        let (project, dataset, table) = match (project, parts.as_slice()) {
            (Some(p), [d, t]) => (p, *d, *t),
            (Some(domain), [p, d, t]) => (format!("{domain}:{p}"), *d, *t),
            (None, [p, d, t]) => (p.to_string(), *d, *t),
            (None, [d, t]) => {
                let p = default_project.ok_or_else(invalid)?;
                (p.as_str().to_string(), *d, *t)
            }
            _ => return Err(invalid()),
        };

        if [project.as_str(), dataset, table]
            .iter()
            .any(|part| part.trim().is_empty())
            || project.matches(':').count() > 1
            || project.split(':').any(|part| part.trim().is_empty())
            || project.rsplit(':').next().is_some_and(|id| id.contains('.'))
            || dataset.contains(':')
            || table.contains(':')
        {
            return Err(invalid());
        }

        Ok(Self::new(ProjectId::new(project), dataset, table))
    }
}

impl FromStr for TableName {
    type Err = BqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default_project(s, None)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}
