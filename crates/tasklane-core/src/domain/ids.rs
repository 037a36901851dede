//! Domain identifiers.
//!
//! # ULID ベースの TaskId
//! task_id は ULID (Universally Unique Lexicographically Sortable Identifier) です。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **分散生成可能**: 共有カウンタなしで複数スレッド・複数ノードで生成できる
//! - **UUID互換**: 128-bit で UUID と同じサイズ
//!
//! wire 上では 26 文字の Crockford base32 文字列として流れます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Identifier of a task, assigned once at enqueue time.
///
/// The same value is used as the broker deduplication id.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Ulid);

impl TaskId {
    /// ULID から TaskId を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// ULID の timestamp 部分（ミリ秒）
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_displays_as_plain_ulid() {
        let ulid = Ulid::new();
        let task_id = TaskId::from_ulid(ulid);

        assert_eq!(task_id.to_string(), ulid.to_string());
        assert_eq!(task_id.to_string().len(), 26);
    }

    #[test]
    fn task_id_serializes_as_string() {
        let task_id = TaskId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&task_id).unwrap();
        assert_eq!(serialized, format!("\"{task_id}\""));

        let deserialized: TaskId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(task_id, deserialized);
    }

    #[test]
    fn task_id_parses_from_str() {
        let task_id = TaskId::from_ulid(Ulid::new());
        let parsed: TaskId = task_id.to_string().parse().unwrap();
        assert_eq!(parsed, task_id);

        assert!("not-a-ulid".parse::<TaskId>().is_err());
    }

    #[test]
    fn ulid_ids_are_sortable() {
        // ULID は時刻ベースなので、生成順序でソート可能
        let id1 = TaskId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TaskId::from_ulid(Ulid::new());

        assert!(id1 < id2);
        assert!(id1.timestamp_ms() <= id2.timestamp_ms());
    }

    #[test]
    fn task_id_is_the_size_of_a_ulid() {
        use std::mem::size_of;

        assert_eq!(size_of::<TaskId>(), size_of::<Ulid>());
        assert_eq!(size_of::<Ulid>(), 16);
    }
}
