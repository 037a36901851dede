//! ApiResponse - HTTP 応答の組み立て
//!
//! status / headers / body の 3 要素だけを持ちます（プラットフォームの
//! proxy 統合形式 `{"statusCode","headers","body"}` にそのまま直列化できる）。

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::domain::TaskId;

pub const CREATED_MESSAGE: &str = "Task created successfully";
pub const QUEUED_STATUS: &str = "queued";
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON in request body";
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Failed to process task";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Headers attached to every response.
pub const RESPONSE_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "POST,OPTIONS"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    #[serde(rename = "statusCode", serialize_with = "status_as_u16")]
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    fn json(status: StatusCode, body: Value) -> Self {
        let headers = RESPONSE_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self {
            status,
            headers,
            body: body.to_string(),
        }
    }

    /// 200 with the new task id.
    pub fn created(task_id: TaskId) -> Self {
        Self::json(
            StatusCode::OK,
            json!({
                "message": CREATED_MESSAGE,
                "task_id": task_id.to_string(),
                "status": QUEUED_STATUS,
            }),
        )
    }

    /// 400 with a caller-facing message.
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::json(StatusCode::BAD_REQUEST, json!({ "error": error.into() }))
    }

    /// 500 for a broker failure.
    pub fn transport_failure(details: impl Into<String>) -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": TRANSPORT_FAILURE_MESSAGE, "details": details.into() }),
        )
    }

    /// 500 for anything else.
    pub fn internal_error(details: impl Into<String>) -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": INTERNAL_ERROR_MESSAGE, "details": details.into() }),
        )
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Parses the body back; bodies are always JSON objects.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

fn status_as_u16<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}
