//! Sanitizer - 検証済み Task の正規化
//!
//! 前提: 入力は validate() を通過済み（ここでは再検証しない）。

use crate::domain::{NormalizedTask, Task};

/// Trims text fields and case-folds the priority. Total: never fails.
///
/// An empty `due_date` is dropped entirely rather than kept as `""`.
pub fn sanitize(task: Task) -> NormalizedTask {
    let due_date = task
        .due_date
        .filter(|due_date| !due_date.is_empty())
        .map(|due_date| due_date.trim().to_string());

    NormalizedTask::new(
        task.title.trim().to_string(),
        task.description.trim().to_string(),
        task.priority.trim().to_lowercase(),
        due_date,
    )
}
