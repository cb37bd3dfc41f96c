//! App - アプリケーション層
//!
//! ports を組み合わせたクエリジョブのプロキシを提供します。

pub mod query_job;

pub use self::query_job::{DEFAULT_POLL_SLICE, QueryJob};
