//! Domain model (IDs, job state, remote errors, job proxy, result table).

pub mod errors;
pub mod ids;
pub mod job;
pub mod state;
pub mod table;

pub use self::errors::{JobError, format_errors};
pub use self::ids::{JobId, ProjectId, TableName};
pub use self::job::{DEFAULT_POLL_INTERVAL, Job};
pub use self::state::{JobState, JobStatus};
pub use self::table::QueryResultsTable;
