//! BatchConsumer - バッチ内の各メッセージを独立に処理
//!
//! # 学習ポイント
//! - 1 件の失敗がバッチ全体を止めない（早期 return しない）
//! - processor は別 task で走らせ、panic も JoinError として「その 1 件の失敗」に閉じ込める
//! - ack/delete はしない: 失敗 id を BatchResult で返すだけ

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::{BatchItem, BatchResult, DecodeError, DeliveredTask, ErrorKind, ProcessingError};
use crate::ports::TaskProcessor;

#[derive(Debug, thiserror::Error)]
enum ItemFailure {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl ItemFailure {
    fn kind(&self) -> ErrorKind {
        match self {
            ItemFailure::Decode(err) => err.kind(),
            ItemFailure::Processing(err) => err.kind(),
        }
    }
}

pub struct BatchConsumer {
    processor: Arc<dyn TaskProcessor>,
}

impl BatchConsumer {
    pub fn new(processor: Arc<dyn TaskProcessor>) -> Self {
        Self { processor }
    }

    /// Processes every item in received order and reports the ones to redeliver.
    pub async fn process_batch(&self, items: &[BatchItem]) -> BatchResult {
        let mut result = BatchResult::new();

        for item in items {
            debug!(message_id = %item.message_id, receipt_handle = %item.receipt_handle, "processing message");
            if let Err(err) = self.process_item(item).await {
                error!(
                    message_id = %item.message_id,
                    kind = ?err.kind(),
                    error = %err,
                    "message failed"
                );
                result.record_failure(item.message_id.clone());
            }
        }

        if result.is_empty() {
            info!(total = items.len(), "batch processed");
        } else {
            warn!(
                total = items.len(),
                failed = result.len(),
                "batch processed with failures"
            );
        }
        result
    }

    async fn process_item(&self, item: &BatchItem) -> Result<(), ItemFailure> {
        let task = DeliveredTask::decode(&item.body)?;

        let processor = Arc::clone(&self.processor);
        let outcome = tokio::spawn(async move { processor.process(&task).await })
            .await
            .map_err(|e| ProcessingError::Unexpected(format!("processor task failed: {e}")))??;

        info!(
            message_id = %item.message_id,
            task_id = %outcome.task_id,
            "task processed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProcessingResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Accepts anything with a task_id and records what it saw.
    #[derive(Default)]
    struct RecordingProcessor {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TaskProcessor for RecordingProcessor {
        async fn process(&self, task: &DeliveredTask) -> Result<ProcessingResult, ProcessingError> {
            let task_id = task
                .get_str("task_id")
                .ok_or_else(|| ProcessingError::MissingField("task_id".into()))?
                .to_string();
            self.seen.lock().unwrap().push(task_id.clone());
            Ok(ProcessingResult::completed(task_id))
        }
    }

    struct PanickingProcessor;

    #[async_trait]
    impl TaskProcessor for PanickingProcessor {
        async fn process(&self, _task: &DeliveredTask) -> Result<ProcessingResult, ProcessingError> {
            panic!("downstream exploded");
        }
    }

    fn item(id: &str, body: &str) -> BatchItem {
        BatchItem::new(id, format!("rh-{id}"), body)
    }

    #[tokio::test]
    async fn malformed_item_does_not_stop_batch() {
        let processor = Arc::new(RecordingProcessor::default());
        let consumer = BatchConsumer::new(processor.clone());

        let result = consumer
            .process_batch(&[
                item("id1", r#"{"task_id":"t1"}"#),
                item("id2", "invalid json{"),
                item("id3", r#"{"task_id":"t3"}"#),
            ])
            .await;

        assert_eq!(result.failed_ids(), vec!["id2"]);
        assert_eq!(*processor.seen.lock().unwrap(), vec!["t1", "t3"]);
    }

    #[tokio::test]
    async fn empty_batch_has_no_failures() {
        let consumer = BatchConsumer::new(Arc::new(RecordingProcessor::default()));
        assert!(consumer.process_batch(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn processing_errors_are_recorded_in_order() {
        let consumer = BatchConsumer::new(Arc::new(RecordingProcessor::default()));

        let result = consumer
            .process_batch(&[
                item("a", r#"{"title":"no id"}"#),
                item("b", r#"{"task_id":"ok"}"#),
                item("c", "[1,2]"),
            ])
            .await;

        assert_eq!(result.failed_ids(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn panic_is_isolated_to_item() {
        let consumer = BatchConsumer::new(Arc::new(PanickingProcessor));

        let result = consumer
            .process_batch(&[item("p1", r#"{"task_id":"t1"}"#), item("p2", r#"{"task_id":"t2"}"#)])
            .await;

        assert_eq!(result.failed_ids(), vec!["p1", "p2"]);
    }
}
