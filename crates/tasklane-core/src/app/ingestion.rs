//! IngestionGateway - 受付: 検証 → 正規化 → envelope 化 → 送信
//!
//! # 学習ポイント
//! - 送信は 1 回だけ（リトライは呼び出し元の判断）
//! - 検証で落ちたリクエストはキューに一切触れない
//! - 結果は 4 種類の IngestResult に必ず収まる

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use super::envelope_builder::EnvelopeBuilder;
use super::response::{ApiResponse, INVALID_JSON_MESSAGE};
use super::sanitizer::sanitize;
use super::validator::validate;
use crate::domain::{TaskId, ValidationError};
use crate::ports::{QueueError, TaskQueue};

/// Outcome of one ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestResult {
    /// Queued; the broker accepted the envelope.
    Accepted(TaskId),
    /// Caller input defect; nothing was sent.
    Rejected(ValidationError),
    /// The broker could not be reached or refused the send.
    TransportFailure(QueueError),
    /// Anything else (e.g. the envelope could not be encoded).
    Fault(String),
}

impl IngestResult {
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            IngestResult::Accepted(task_id) => Some(*task_id),
            _ => None,
        }
    }

    pub fn into_response(self) -> ApiResponse {
        match self {
            IngestResult::Accepted(task_id) => ApiResponse::created(task_id),
            IngestResult::Rejected(err) => ApiResponse::bad_request(err.to_string()),
            IngestResult::TransportFailure(err) => ApiResponse::transport_failure(err.to_string()),
            IngestResult::Fault(details) => ApiResponse::internal_error(details),
        }
    }
}

/// IngestionGateway は 1 リクエストを 1 つの IngestResult に変換
///
/// # 使用例
/// ```ignore
/// let gateway = IngestionGateway::new(queue, EnvelopeBuilder::system());
/// let response = gateway.handle_request(body).await;
/// ```
pub struct IngestionGateway {
    queue: Arc<dyn TaskQueue>,
    builder: EnvelopeBuilder,
}

impl IngestionGateway {
    pub fn new(queue: Arc<dyn TaskQueue>, builder: EnvelopeBuilder) -> Self {
        Self { queue, builder }
    }

    pub async fn ingest(&self, raw: &Value) -> IngestResult {
        let task = match validate(raw) {
            Ok(task) => task,
            Err(err) => {
                warn!(field = err.field(), error = %err, "task rejected");
                return IngestResult::Rejected(err);
            }
        };

        let envelope = self.builder.build(sanitize(task));
        let task_id = envelope.task_id();

        let message = match self.builder.outbound(&envelope) {
            Ok(message) => message,
            Err(err) => {
                error!(%task_id, error = %err, "envelope encoding failed");
                return IngestResult::Fault(err.to_string());
            }
        };

        match self.queue.send(message).await {
            Ok(receipt) => {
                info!(%task_id, message_id = %receipt.message_id, "task queued");
                IngestResult::Accepted(task_id)
            }
            Err(err) => {
                error!(%task_id, error = %err, "failed to send task to queue");
                IngestResult::TransportFailure(err)
            }
        }
    }

    /// Full request cycle for a raw HTTP body.
    pub async fn handle_request(&self, body: &str) -> ApiResponse {
        let raw = match serde_json::from_str::<Value>(body) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "request body is not JSON");
                return ApiResponse::bad_request(INVALID_JSON_MESSAGE);
            }
        };
        self.ingest(&raw).await.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::response::TRANSPORT_FAILURE_MESSAGE;
    use crate::domain::DeliveredTask;
    use crate::ports::{OutboundMessage, SendReceipt};
    use async_trait::async_trait;
    use http::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingQueue {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl RecordingQueue {
        fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskQueue for RecordingQueue {
        async fn send(&self, message: OutboundMessage) -> Result<SendReceipt, QueueError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(message);
            Ok(SendReceipt {
                message_id: format!("msg-{}", sent.len()),
            })
        }
    }

    struct FailingQueue;

    #[async_trait]
    impl TaskQueue for FailingQueue {
        async fn send(&self, _message: OutboundMessage) -> Result<SendReceipt, QueueError> {
            Err(QueueError::Unavailable("SQS error".into()))
        }
    }

    fn gateway(queue: Arc<dyn TaskQueue>) -> IngestionGateway {
        IngestionGateway::new(queue, EnvelopeBuilder::system())
    }

    #[tokio::test]
    async fn accepted_task_is_sent_once() {
        let queue = Arc::new(RecordingQueue::default());
        let gw = gateway(queue.clone());

        let result = gw
            .ingest(&json!({
                "title": "  Test Task  ",
                "description": "Test description",
                "priority": "high",
                "due_date": "2025-12-31T23:59:59Z"
            }))
            .await;

        let task_id = result.task_id().expect("accepted");
        let sent = queue.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].deduplication_id, task_id.to_string());
        assert_eq!(sent[0].message_group_id, "task-processing");

        let body = DeliveredTask::decode(&sent[0].body).unwrap();
        assert_eq!(body.get_str("title"), Some("Test Task"));
        assert_eq!(body.get_str("task_id"), Some(task_id.to_string().as_str()));
    }

    #[tokio::test]
    async fn rejected_task_never_touches_queue() {
        let queue = Arc::new(RecordingQueue::default());
        let gw = gateway(queue.clone());

        let result = gw
            .ingest(&json!({"title": "", "description": "d", "priority": "low"}))
            .await;

        assert_eq!(result, IngestResult::Rejected(ValidationError::EmptyValue("title")));
        assert!(queue.sent().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let gw = gateway(Arc::new(FailingQueue));
        let response = gw
            .handle_request(r#"{"title":"t","description":"d","priority":"low"}"#)
            .await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.body_json().unwrap();
        assert_eq!(body["error"], TRANSPORT_FAILURE_MESSAGE);
        assert!(body["details"].as_str().unwrap().contains("SQS error"));
    }

    #[tokio::test]
    async fn handle_request_created() {
        let queue = Arc::new(RecordingQueue::default());
        let response = gateway(queue.clone())
            .handle_request(
                r#"{"title":"Test Task","description":"Test description","priority":"medium"}"#,
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        let body = response.body_json().unwrap();
        assert_eq!(body["status"], "queued");
        assert_eq!(body["message"], "Task created successfully");
        assert_eq!(queue.sent().len(), 1);
    }

    #[tokio::test]
    async fn handle_request_invalid_json() {
        let queue = Arc::new(RecordingQueue::default());
        let response = gateway(queue.clone()).handle_request("invalid json{").await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body_json().unwrap()["error"], INVALID_JSON_MESSAGE);
        assert!(queue.sent().is_empty());
    }

    #[tokio::test]
    async fn handle_request_empty_object() {
        let queue = Arc::new(RecordingQueue::default());
        let response = gateway(queue.clone()).handle_request("{}").await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body_json().unwrap()["error"],
            "Missing required field: title"
        );
    }

    #[tokio::test]
    async fn handle_request_validation_message() {
        let response = gateway(Arc::new(RecordingQueue::default()))
            .handle_request(r#"{"title":"t","description":"d","priority":"urgent"}"#)
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body_json().unwrap()["error"],
            "priority must be one of: low, medium, high"
        );
    }

    #[test]
    fn fault_maps_to_internal_server_error() {
        let response = IngestResult::Fault("failed to encode task envelope".into()).into_response();

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        let body = response.body_json().unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["details"], "failed to encode task envelope");
    }

    #[test]
    fn only_accepted_results_carry_a_task_id() {
        assert_eq!(IngestResult::Fault("x".into()).task_id(), None);
        assert_eq!(
            IngestResult::TransportFailure(QueueError::Throttled("slow down".into())).task_id(),
            None
        );
    }
}
