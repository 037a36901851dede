//! tasklane-core
//!
//! Task intake and processing pipeline over an ordered, deduplicating queue.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, envelope, batch, outcome, errors）
//! - **ports**: 抽象化レイヤー（TaskQueue, MessageSource, TaskProcessor, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（validator, sanitizer, ingestion, consumer, poller）
//! - **impls**: 実装（InMemoryTaskQueue, DefaultTaskProcessor）
//! - **config**: 環境変数からの設定
//! - **observability**: キューの件数ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use config::{ConfigError, QueueConfig};
pub use observability::QueueCounts;
