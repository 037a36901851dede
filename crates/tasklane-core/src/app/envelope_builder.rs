//! EnvelopeBuilder - task_id / created_at の付与と送信メッセージの組み立て
//!
//! # 学習ポイント
//! - IdGenerator / Clock をポートとして注入（テストでは FixedClock）
//! - 共有カウンタなし: 並行呼び出しでも task_id が衝突しない

use std::sync::Arc;

use chrono::SubsecRound;

use crate::domain::{DEFAULT_MESSAGE_GROUP_ID, EncodeError, NormalizedTask, TaskEnvelope};
use crate::ports::{Clock, IdGenerator, OutboundMessage, SystemClock, UlidGenerator};

/// Wire precision of `created_at`.
const CREATED_AT_SUBSEC_DIGITS: u16 = 6;

/// EnvelopeBuilder は NormalizedTask を TaskEnvelope に変換
///
/// # 使用例
/// ```ignore
/// let builder = EnvelopeBuilder::system();
/// let envelope = builder.build(sanitize(task));
/// let message = builder.outbound(&envelope)?;
/// ```
#[derive(Clone)]
pub struct EnvelopeBuilder {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    message_group_id: String,
}

impl EnvelopeBuilder {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ids,
            clock,
            message_group_id: DEFAULT_MESSAGE_GROUP_ID.to_string(),
        }
    }

    /// ULID ids and the system clock.
    pub fn system() -> Self {
        Self::new(Arc::new(UlidGenerator::new(SystemClock)), Arc::new(SystemClock))
    }

    pub fn with_message_group_id(mut self, message_group_id: impl Into<String>) -> Self {
        self.message_group_id = message_group_id.into();
        self
    }

    /// Assigns a fresh task id and the current time, once each.
    pub fn build(&self, task: NormalizedTask) -> TaskEnvelope {
        let task_id = self.ids.generate_task_id();
        let created_at = self.clock.now().trunc_subsecs(CREATED_AT_SUBSEC_DIGITS);
        TaskEnvelope::new(task_id, created_at, task)
    }

    /// Serializes the envelope and attaches the ordering group and dedup id.
    pub fn outbound(&self, envelope: &TaskEnvelope) -> Result<OutboundMessage, EncodeError> {
        Ok(OutboundMessage {
            body: envelope.to_json()?,
            message_group_id: self.message_group_id.clone(),
            deduplication_id: envelope.deduplication_id(),
        })
    }
}
