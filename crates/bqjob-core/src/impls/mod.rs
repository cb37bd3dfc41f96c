//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpJobsApi**: REST v2 クライアント（本番用）
//! - **ScriptedJobsApi**: 台本どおりに応答する in-memory 実装（テスト・dry-run 用）

pub mod http;
pub mod inmem;

pub use self::http::HttpJobsApi;
pub use self::inmem::ScriptedJobsApi;
