//! TaskQueue port - 順序保証・重複排除付きキュー（SQS FIFO または InMemory）
//!
//! キュー本体の FIFO / dedup 保証は broker 側の責務です。
//! このクレートは「正しく使う」側だけを実装します。
//!
//! # 実装
//! - **InMemoryTaskQueue**: 開発・テスト用（`impls::inmem_queue`）
//! - **SqsTaskQueue**: 本番用（`tasklane-sqs` クレート）

use async_trait::async_trait;

use crate::domain::BatchItem;

/// A message ready to be sent: body plus ordering and dedup keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: String,
    pub message_group_id: String,
    pub deduplication_id: String,
}

/// What the broker reports back for an accepted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),

    #[error("queue does not exist: {0}")]
    QueueNotFound(String),

    #[error("request throttled: {0}")]
    Throttled(String),

    #[error("unknown receipt handle: {0}")]
    UnknownReceipt(String),

    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

impl QueueError {
    pub fn kind(&self) -> crate::domain::ErrorKind {
        crate::domain::ErrorKind::Transport
    }
}

/// TaskQueue は envelope を broker に渡す送信側ポート
///
/// # 設計原則
/// - 1 回の呼び出し = 1 回の送信試行（内部でリトライしない）
/// - `Send + Sync`: 1 つのクライアントを全リクエストで共有する
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<SendReceipt, QueueError>;
}

/// MessageSource は受信側ポート（呼び出し元プラットフォームの役割）
///
/// パイプライン自体は ack/delete をしません。
/// `Poller` が BatchResult を見て delete / release を決めます。
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Receive up to `max_messages` visible messages.
    async fn receive(&self, max_messages: usize) -> Result<Vec<BatchItem>, QueueError>;

    /// Permanently remove a processed message.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;

    /// Hand a failed message back for redelivery.
    ///
    /// Brokers with a visibility timeout redeliver on their own, so the default
    /// does nothing.
    async fn release(&self, _receipt_handle: &str) -> Result<(), QueueError> {
        Ok(())
    }
}
