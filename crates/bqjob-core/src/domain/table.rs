//! Result table handle produced by a query job.

use std::fmt;

use super::ids::{JobId, TableName};

/// The temporary table a query job writes its rows into.
///
/// The handle exists from the moment the query job is constructed, but the
/// table only holds valid data once that job has completed successfully.
/// Reading rows is the job of a separate reader and is not done here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResultsTable {
    name: TableName,
    job_id: JobId,
    is_temporary: bool,
}

impl QueryResultsTable {
    pub fn new(name: TableName, job_id: JobId, is_temporary: bool) -> Self {
        Self {
            name,
            job_id,
            is_temporary,
        }
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    /// The job that populates this table.
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

impl fmt::Display for QueryResultsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Results table {}", self.name)?;
        if self.is_temporary {
            f.write_str(" (temporary)")?;
        }
        Ok(())
    }
}
