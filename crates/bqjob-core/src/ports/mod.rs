//! Ports - 抽象化レイヤー
//!
//! 外部システム（クエリサービスの REST API、時計）へのインターフェースを
//! trait として定義し、実装の詳細を隠蔽します。

pub mod api;
pub mod clock;

pub use self::api::{JobReference, JobResource, JobsApi, QueryResultsResponse};
pub use self::clock::{Clock, FixedClock, SystemClock};
