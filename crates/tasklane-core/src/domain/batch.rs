//! Batch model: delivered items, decoded bodies, and the partial-failure result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::envelope::TaskEnvelope;
use super::errors::DecodeError;

/// One message delivered by the broker.
///
/// Field names follow the broker's event record shape (`messageId`,
/// `receiptHandle`, `body`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

impl BatchItem {
    pub fn new(
        message_id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            receipt_handle: receipt_handle.into(),
            body: body.into(),
        }
    }
}

/// A message body decoded into a JSON object.
///
/// Broker payloads are not trusted to be envelopes; field presence is checked
/// by the processor, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredTask {
    fields: Map<String, Value>,
}

impl DeliveredTask {
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(DecodeError::NotAnObject),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Reads the body back as a typed envelope.
    pub fn to_envelope(&self) -> Result<TaskEnvelope, DecodeError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| DecodeError::NotAnEnvelope(e.to_string()))
    }
}

/// One entry of the partial-failure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

/// Message ids that must be redelivered, in encounter order.
///
/// Serializes as `{"batchItemFailures":[{"itemIdentifier":"..."}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(rename = "batchItemFailures")]
    failures: Vec<BatchItemFailure>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, message_id: impl Into<String>) {
        self.failures.push(BatchItemFailure {
            item_identifier: message_id.into(),
        });
    }

    pub fn failures(&self) -> &[BatchItemFailure] {
        &self.failures
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|f| f.item_identifier.as_str())
            .collect()
    }

    pub fn is_failed(&self, message_id: &str) -> bool {
        self.failures.iter().any(|f| f.item_identifier == message_id)
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_accepts_objects_only() {
        let task = DeliveredTask::decode(r#"{"task_id":"abc","title":"t"}"#).unwrap();
        assert!(task.contains("task_id"));
        assert_eq!(task.get_str("title"), Some("t"));

        assert!(matches!(
            DeliveredTask::decode("[1,2,3]"),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            DeliveredTask::decode("invalid json{"),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn batch_item_uses_event_record_names() {
        let item: BatchItem = serde_json::from_value(json!({
            "messageId": "msg-1",
            "receiptHandle": "rh-1",
            "body": "{}"
        }))
        .unwrap();
        assert_eq!(item, BatchItem::new("msg-1", "rh-1", "{}"));
    }

    #[test]
    fn batch_result_keeps_encounter_order() {
        let mut result = BatchResult::new();
        result.record_failure("msg-3");
        result.record_failure("msg-1");

        assert_eq!(result.failed_ids(), vec!["msg-3", "msg-1"]);
        assert!(result.is_failed("msg-1"));
        assert!(!result.is_failed("msg-2"));
    }

    #[test]
    fn batch_result_wire_shape() {
        let mut result = BatchResult::new();
        result.record_failure("msg-123");

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v, json!({"batchItemFailures": [{"itemIdentifier": "msg-123"}]}));

        let empty = serde_json::to_value(BatchResult::new()).unwrap();
        assert_eq!(empty, json!({"batchItemFailures": []}));
    }
}
