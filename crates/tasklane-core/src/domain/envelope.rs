//! TaskEnvelope - キューに載せる単位
//!
//! NormalizedTask に task_id と created_at を付けたものです。
//! ordering-group と dedup id は envelope の外（送信メッセージ側）に付きます。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ids::TaskId;
use super::task::NormalizedTask;

/// The single ordering lane every task is funneled into.
///
/// One group means strict global FIFO order at the cost of parallel delivery.
pub const DEFAULT_MESSAGE_GROUP_ID: &str = "task-processing";

/// Renders a timestamp the way `created_at` travels on the wire:
/// RFC 3339, six fractional digits, `Z` suffix.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// TaskEnvelope はキュー上のタスク 1 件
///
/// # wire 形式
/// ```json
/// {"task_id":"01J...","created_at":"2025-01-01T12:00:00.000000Z",
///  "title":"...","description":"...","priority":"high","due_date":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    task_id: TaskId,
    #[serde(with = "wire_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    task: NormalizedTask,
}

impl TaskEnvelope {
    pub fn new(task_id: TaskId, created_at: DateTime<Utc>, task: NormalizedTask) -> Self {
        Self {
            task_id,
            created_at,
            task,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn task(&self) -> &NormalizedTask {
        &self.task
    }

    /// The broker deduplication id: the task id itself.
    pub fn deduplication_id(&self) -> String {
        self.task_id.to_string()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

mod wire_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
