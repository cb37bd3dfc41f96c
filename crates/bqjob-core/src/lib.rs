//! bqjob-core
//!
//! Client-side proxy for asynchronous query jobs on a remote query service.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, errors, job, table）
//! - **ports**: 抽象化レイヤー（JobsApi, Clock）
//! - **app**: QueryJob（完了待ちと結果テーブルの受け渡し）
//! - **impls**: 実装（HttpJobsApi, ScriptedJobsApi）
//! - **config**: 環境変数からのクライアント設定
//! - **observability**: tracing の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::QueryJob;
pub use config::ClientConfig;
pub use error::{ApiError, BqError};
