//! DefaultTaskProcessor - 副作用のない標準 processor
//!
//! 必須フィールドの存在だけを確認して完了とします（値の形式は問わない）。
//! 同じ入力には常に同じ結果を返します（カウンタ・時刻を持たない）。

use async_trait::async_trait;
use tracing::info;

use serde_json::Value;

use crate::domain::{DeliveredTask, ProcessingError, ProcessingResult};
use crate::ports::TaskProcessor;

/// Checked in this order; the first absent one is reported.
pub const REQUIRED_FIELDS: [&str; 5] = ["task_id", "title", "description", "priority", "created_at"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTaskProcessor;

impl DefaultTaskProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskProcessor for DefaultTaskProcessor {
    async fn process(&self, task: &DeliveredTask) -> Result<ProcessingResult, ProcessingError> {
        if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| !task.contains(field)) {
            return Err(ProcessingError::MissingField(missing.to_string()));
        }

        // non-string ids are echoed as their JSON text
        let task_id = match task.get("task_id") {
            Some(Value::String(task_id)) => task_id.clone(),
            Some(other) => other.to_string(),
            None => return Err(ProcessingError::MissingField("task_id".to_string())),
        };

        info!(
            task_id = %task_id,
            priority = task.get_str("priority").unwrap_or_default(),
            title = task.get_str("title").unwrap_or_default(),
            "processing task"
        );

        Ok(ProcessingResult::completed(task_id))
    }
}
