//! TaskProcessor port - 配送されたタスク 1 件の処理
//!
//! 永続化や下流処理を足すならここが差し替えポイントです。

use async_trait::async_trait;

use crate::domain::{DeliveredTask, ProcessingError, ProcessingResult};

/// A processor for delivered tasks.
///
/// Delivery is at-least-once, so implementations must be idempotent: the same
/// input always produces the same result and no observable side effect
/// accumulates across calls.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    async fn process(&self, task: &DeliveredTask) -> Result<ProcessingResult, ProcessingError>;
}
