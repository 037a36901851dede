//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTaskQueue**: 開発・テスト用の FIFO キュー
//! - **DefaultTaskProcessor**: 副作用のない標準 processor
//!
//! # 本番用実装
//! 本番用のキューは別クレートに配置します：
//! - `tasklane-sqs`: SqsTaskQueue

pub mod inmem_queue;
pub mod processor;

// 主要な型を再エクスポート
pub use self::inmem_queue::{DEDUPLICATION_WINDOW, InMemoryTaskQueue};
pub use self::processor::DefaultTaskProcessor;
