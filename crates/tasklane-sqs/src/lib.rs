//! tasklane-sqs
//!
//! SQS FIFO implementation of the `TaskQueue` and `MessageSource` ports.
//!
//! The queue must be a FIFO queue (`.fifo`): every send carries a
//! `MessageGroupId` and a `MessageDeduplicationId`, and SQS enforces ordering
//! and the five-minute deduplication window.
//!
//! ```rust,no_run
//! use tasklane_sqs::SqsTaskQueue;
//!
//! # async fn example() {
//! let queue = SqsTaskQueue::from_env("https://sqs.us-east-1.amazonaws.com/123456789012/tasks.fifo").await;
//! # }
//! ```

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::Message;
use tasklane_core::domain::BatchItem;
use tasklane_core::ports::{MessageSource, OutboundMessage, QueueError, SendReceipt, TaskQueue};
use tracing::{debug, warn};

/// SQS caps a single receive at ten messages.
pub const MAX_RECEIVE_MESSAGES: usize = 10;

/// SQS caps long polling at twenty seconds.
pub const MAX_WAIT_TIME_SECONDS: u32 = 20;

pub struct SqsTaskQueue {
    client: Client,
    queue_url: String,
    wait_time_seconds: u32,
}

impl SqsTaskQueue {
    /// Creates a queue handle with a pre-built SQS client.
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            wait_time_seconds: MAX_WAIT_TIME_SECONDS,
        }
    }

    /// Creates a queue handle using the standard AWS SDK config chain.
    ///
    /// Credentials and region come from environment variables, AWS profiles
    /// or the instance/Lambda metadata endpoint.
    pub async fn from_env(queue_url: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), queue_url)
    }

    /// Long-poll duration for `receive`, clamped to the SQS maximum.
    pub fn with_wait_time(mut self, seconds: u32) -> Self {
        self.wait_time_seconds = seconds.min(MAX_WAIT_TIME_SECONDS);
        self
    }
}

/// Maps an AWS error code onto the queue error taxonomy.
///
/// `None` means the request never got a service response (dispatch failure,
/// timeout, credentials).
fn classify(code: Option<&str>, detail: String) -> QueueError {
    match code {
        None => QueueError::Unavailable(detail),
        Some(
            "AWS.SimpleQueueService.NonExistentQueue" | "QueueDoesNotExist" | "NonExistentQueue",
        ) => QueueError::QueueNotFound(detail),
        Some(
            "ThrottlingException"
            | "Throttling"
            | "RequestThrottled"
            | "AWS.SimpleQueueService.RequestThrottled",
        ) => QueueError::Throttled(detail),
        Some("ReceiptHandleIsInvalid" | "InvalidReceiptHandle") => {
            QueueError::UnknownReceipt(detail)
        }
        Some(_) => QueueError::OperationFailed(detail),
    }
}

/// Maps an AWS SDK error to a [`QueueError`].
fn map_sdk_error<E, R>(err: SdkError<E, R>, operation: &str) -> QueueError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let detail = format!("SQS {operation} failed: {}", DisplayErrorContext(&err));
    classify(code.as_deref(), detail)
}

/// Converts a received message; messages without an id or receipt handle
/// cannot be settled and are skipped.
fn to_batch_item(message: &Message) -> Option<BatchItem> {
    let message_id = message.message_id()?;
    let receipt_handle = message.receipt_handle()?;
    Some(BatchItem::new(
        message_id,
        receipt_handle,
        message.body().unwrap_or_default(),
    ))
}

#[async_trait]
impl TaskQueue for SqsTaskQueue {
    async fn send(&self, message: OutboundMessage) -> Result<SendReceipt, QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message.body)
            .message_group_id(message.message_group_id)
            .message_deduplication_id(message.deduplication_id)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "SendMessage"))?;

        Ok(SendReceipt {
            message_id: output.message_id().unwrap_or_default().to_string(),
        })
    }
}

#[async_trait]
impl MessageSource for SqsTaskQueue {
    async fn receive(&self, max_messages: usize) -> Result<Vec<BatchItem>, QueueError> {
        let max_messages = max_messages.clamp(1, MAX_RECEIVE_MESSAGES) as i32;
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(self.wait_time_seconds as i32)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "ReceiveMessage"))?;

        let items: Vec<BatchItem> = output
            .messages()
            .iter()
            .filter_map(|message| {
                let item = to_batch_item(message);
                if item.is_none() {
                    warn!(message_id = ?message.message_id(), "skipping message without id or receipt handle");
                }
                item
            })
            .collect();
        debug!(count = items.len(), "received messages");
        Ok(items)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "DeleteMessage"))?;
        Ok(())
    }
}
