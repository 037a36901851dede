//! Poller - 受信 → BatchConsumer → delete / release のループ
//!
//! Lambda のイベントソースが担う役割をプロセス内で再現します。
//! パイプライン本体（BatchConsumer）は ack しないので、ここで BatchResult を
//! 見て成功分を delete し、失敗分を release します。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::consumer::BatchConsumer;
use crate::domain::{BatchItem, BatchResult};
use crate::ports::{MessageSource, QueueError};

/// Upper bound of one receive call (the SQS limit).
pub const MAX_BATCH_SIZE: usize = 10;

/// What one poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub received: usize,
    pub deleted: usize,
    pub released: usize,
}

/// Deletes the successes and releases the failures of a processed batch.
///
/// Every item is settled even when some calls fail; the first error is
/// returned after the rest have been attempted. Failures are released
/// last-first so a source that pushes to the head of a group ends up with them
/// in their original order.
pub async fn settle(
    source: &dyn MessageSource,
    items: &[BatchItem],
    result: &BatchResult,
) -> Result<PollSummary, QueueError> {
    let mut summary = PollSummary {
        received: items.len(),
        ..PollSummary::default()
    };
    let mut first_error = None;

    for item in items.iter().filter(|i| !result.is_failed(&i.message_id)) {
        match source.delete(&item.receipt_handle).await {
            Ok(()) => summary.deleted += 1,
            Err(err) => {
                error!(message_id = %item.message_id, error = %err, "delete failed");
                first_error.get_or_insert(err);
            }
        }
    }
    for item in items.iter().rev().filter(|i| result.is_failed(&i.message_id)) {
        debug!(message_id = %item.message_id, receipt_handle = %item.receipt_handle, "releasing message");
        match source.release(&item.receipt_handle).await {
            Ok(()) => summary.released += 1,
            Err(err) => {
                error!(message_id = %item.message_id, error = %err, "release failed");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

pub struct Poller {
    source: Arc<dyn MessageSource>,
    consumer: Arc<BatchConsumer>,
    max_messages: usize,
    idle_delay: Duration,
}

impl Poller {
    pub fn new(source: Arc<dyn MessageSource>, consumer: Arc<BatchConsumer>) -> Self {
        Self {
            source,
            consumer,
            max_messages: MAX_BATCH_SIZE,
            idle_delay: Duration::from_millis(200),
        }
    }

    /// Clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Sleep between polls that returned nothing.
    pub fn with_idle_delay(mut self, idle_delay: Duration) -> Self {
        self.idle_delay = idle_delay;
        self
    }

    /// Receive one batch, process it and settle it.
    pub async fn poll_once(&self) -> Result<PollSummary, QueueError> {
        let items = self.source.receive(self.max_messages).await?;
        self.handle(items).await
    }

    async fn handle(&self, items: Vec<BatchItem>) -> Result<PollSummary, QueueError> {
        if items.is_empty() {
            return Ok(PollSummary::default());
        }

        let result = self.consumer.process_batch(&items).await;
        let summary = settle(self.source.as_ref(), &items, &result).await?;
        info!(
            received = summary.received,
            deleted = summary.deleted,
            released = summary.released,
            "batch settled"
        );
        Ok(summary)
    }

    /// Poll until shutdown is signalled. Queue errors are logged, not fatal.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // receive は long poll で待つことがあるので shutdown と競合させる。
            // 受信済みのバッチは shutdown に関係なく settle まで走らせる
            let received = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                received = self.source.receive(self.max_messages) => received,
            };

            let polled = match received {
                Ok(items) => self.handle(items).await,
                Err(err) => Err(err),
            };

            let idle = match polled {
                Ok(summary) => summary.received == 0,
                Err(err) => {
                    error!(error = %err, "poll failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = shutdown_rx.changed() => {}
                    _ = tokio::time::sleep(self.idle_delay) => {}
                }
            }
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move { self.run(shutdown_rx).await });
        PollerHandle { shutdown_tx, join }
    }
}

/// Poller handle.
/// - `request_shutdown()` は新しい受信を止めるだけ（処理中のバッチは最後まで走る）
/// - `shutdown_and_join()` で終了を待てる
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn request_shutdown(&self) {
        // ignore send error: the poller may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
