//! QueueConfig - 環境変数からのキュー設定
//!
//! - `TASK_QUEUE_URL`: 送信先キュー（必須・空文字不可）
//! - `TASK_MESSAGE_GROUP_ID`: ordering group（省略時 `task-processing`）

use crate::domain::DEFAULT_MESSAGE_GROUP_ID;

pub const QUEUE_URL_VAR: &str = "TASK_QUEUE_URL";
pub const MESSAGE_GROUP_ID_VAR: &str = "TASK_MESSAGE_GROUP_ID";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {0} is empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub queue_url: String,
    pub message_group_id: String,
}

impl QueueConfig {
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            message_group_id: DEFAULT_MESSAGE_GROUP_ID.to_string(),
        }
    }

    pub fn with_message_group_id(mut self, message_group_id: impl Into<String>) -> Self {
        self.message_group_id = message_group_id.into();
        self
    }

    /// Builds the config from any key/value source (environment, CLI flags).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let queue_url = lookup(QUEUE_URL_VAR).ok_or(ConfigError::Missing(QUEUE_URL_VAR))?;
        if queue_url.trim().is_empty() {
            return Err(ConfigError::Empty(QUEUE_URL_VAR));
        }

        let config = Self::new(queue_url.trim());
        Ok(match lookup(MESSAGE_GROUP_ID_VAR) {
            Some(group) if !group.trim().is_empty() => config.with_message_group_id(group.trim()),
            _ => config,
        })
    }
}
