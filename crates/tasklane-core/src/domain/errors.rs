//! Errors - エラー型と分類
//!
//! 各コンポーネントは自分のエラー型を `Result` で返します。
//! `ErrorKind` はログ出力や再送判断のための運用分類です。

use serde::Serialize;

/// ErrorKind は失敗の分類
///
/// # 分類
/// - Validation: 呼び出し元の入力不備（再送しても無意味）
/// - Transport: broker に届かない・拒否された
/// - Decode: 配送された payload が壊れている
/// - Processing: envelope は読めたがドメイン前提を満たさない
/// - Unexpected: 上記以外（panic を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Transport,
    Decode,
    Processing,
    Unexpected,
}

impl ErrorKind {
    /// Whether redelivering the same unit of work can succeed.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Validation)
    }
}

/// Caller input defect. Always surfaced as a rejection, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} must be {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),

    #[error("{field} cannot exceed {max} characters")]
    LengthExceeded { field: &'static str, max: usize },

    #[error("{field} must be one of: {}", .allowed.join(", "))]
    InvalidEnum {
        field: &'static str,
        allowed: &'static [&'static str],
    },

    #[error("{0} must be in ISO 8601 format")]
    InvalidTimestamp(&'static str),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field)
            | ValidationError::EmptyValue(field)
            | ValidationError::InvalidTimestamp(field) => *field,
            ValidationError::TypeMismatch { field, .. }
            | ValidationError::LengthExceeded { field, .. }
            | ValidationError::InvalidEnum { field, .. } => *field,
        }
    }
}

/// A delivered message body that cannot be read.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid JSON in message body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("message body must be a JSON object")]
    NotAnObject,

    #[error("message body is not a task envelope: {0}")]
    NotAnEnvelope(String),
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Decode
    }
}

/// A decoded message the processor could not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessingError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to process task: {0}")]
    Unexpected(String),
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::Unexpected(_) => ErrorKind::Unexpected,
            _ => ErrorKind::Processing,
        }
    }
}

/// The envelope could not be serialized for the queue.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode task envelope: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

impl EncodeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Unexpected
    }
}
