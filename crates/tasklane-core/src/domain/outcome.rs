//! Processing outcome: the result format for one processed task.
//!
//! Every field is derived from the delivered task, so processing the same
//! message twice yields an identical value.

use serde::{Deserialize, Serialize};

pub const COMPLETED_MESSAGE: &str = "Task processed successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub task_id: String,
    pub status: ProcessingStatus,
    pub message: String,
}

impl ProcessingResult {
    pub fn completed(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: ProcessingStatus::Completed,
            message: COMPLETED_MESSAGE.to_string(),
        }
    }
}
