//! InMemoryTaskQueue - 開発・テスト用の FIFO キュー
//!
//! # 学習ポイント
//! - group ごとの VecDeque で順序を保証
//! - in-flight のメッセージがある group は受信対象から外す（group lock）
//! - dedup id は一定時間（5 分）記憶し、同じ id の再送は 1 件に畳む
//! - tokio::sync::Mutex: ロックを保持したまま外部コードを await しない

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use ulid::Ulid;

use crate::domain::BatchItem;
use crate::observability::QueueCounts;
use crate::ports::{
    Clock, MessageSource, OutboundMessage, QueueError, SendReceipt, SystemClock, TaskQueue,
};

/// How long an accepted dedup id collapses later sends.
pub const DEDUPLICATION_WINDOW: Duration = Duration::minutes(5);

#[derive(Debug, Clone)]
struct StoredMessage {
    sequence: u64,
    message_id: String,
    group_id: String,
    body: String,
}

#[derive(Debug, Clone)]
struct SeenId {
    message_id: String,
    accepted_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct QueueState {
    next_sequence: u64,
    groups: HashMap<String, VecDeque<StoredMessage>>,
    in_flight: HashMap<String, StoredMessage>,
    seen: HashMap<String, SeenId>,
}

impl QueueState {
    fn locked_groups(&self) -> HashSet<&str> {
        self.in_flight.values().map(|m| m.group_id.as_str()).collect()
    }

    /// Puts a message back into its group, ordered by arrival.
    fn requeue(&mut self, message: StoredMessage) {
        let group = self.groups.entry(message.group_id.clone()).or_default();
        let at = group.partition_point(|m| m.sequence < message.sequence);
        group.insert(at, message);
    }
}

/// InMemoryTaskQueue は単一プロセス内で動く FIFO キュー
///
/// 送信側（TaskQueue）と受信側（MessageSource）の両方を実装します。
///
/// # 使用例
/// ```ignore
/// let queue = Arc::new(InMemoryTaskQueue::new());
/// let gateway = IngestionGateway::new(queue.clone(), EnvelopeBuilder::system());
/// let items = queue.receive(10).await?;
/// ```
pub struct InMemoryTaskQueue {
    state: Mutex<QueueState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            clock,
        }
    }

    pub async fn counts(&self) -> QueueCounts {
        let state = self.state.lock().await;
        QueueCounts {
            visible: state.groups.values().map(VecDeque::len).sum(),
            in_flight: state.in_flight.len(),
        }
    }
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn send(&self, message: OutboundMessage) -> Result<SendReceipt, QueueError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state
            .seen
            .retain(|_, seen| now - seen.accepted_at < DEDUPLICATION_WINDOW);
        if let Some(seen) = state.seen.get(&message.deduplication_id) {
            debug!(
                deduplication_id = %message.deduplication_id,
                message_id = %seen.message_id,
                "duplicate send collapsed"
            );
            return Ok(SendReceipt {
                message_id: seen.message_id.clone(),
            });
        }

        let message_id = Ulid::new().to_string();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.seen.insert(
            message.deduplication_id,
            SeenId {
                message_id: message_id.clone(),
                accepted_at: now,
            },
        );
        state
            .groups
            .entry(message.message_group_id.clone())
            .or_default()
            .push_back(StoredMessage {
                sequence,
                message_id: message_id.clone(),
                group_id: message.message_group_id,
                body: message.body,
            });

        Ok(SendReceipt { message_id })
    }
}

#[async_trait]
impl MessageSource for InMemoryTaskQueue {
    async fn receive(&self, max_messages: usize) -> Result<Vec<BatchItem>, QueueError> {
        let mut state = self.state.lock().await;

        let locked: HashSet<String> = state
            .locked_groups()
            .into_iter()
            .map(str::to_string)
            .collect();

        // oldest head first
        let mut candidates: Vec<(u64, String)> = state
            .groups
            .iter()
            .filter(|(group, _)| !locked.contains(group.as_str()))
            .filter_map(|(group, messages)| messages.front().map(|m| (m.sequence, group.clone())))
            .collect();
        candidates.sort();

        let mut items = Vec::new();
        for (_, group) in candidates {
            while items.len() < max_messages {
                let Some(message) = state.groups.get_mut(&group).and_then(VecDeque::pop_front)
                else {
                    break;
                };
                let receipt_handle = Ulid::new().to_string();
                items.push(BatchItem::new(
                    message.message_id.clone(),
                    receipt_handle.clone(),
                    message.body.clone(),
                ));
                state.in_flight.insert(receipt_handle, message);
            }
        }
        state.groups.retain(|_, messages| !messages.is_empty());

        Ok(items)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        state
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| QueueError::UnknownReceipt(receipt_handle.to_string()))
    }

    async fn release(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let message = state
            .in_flight
            .remove(receipt_handle)
            .ok_or_else(|| QueueError::UnknownReceipt(receipt_handle.to_string()))?;
        state.requeue(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    fn message(body: &str, group: &str, dedup: &str) -> OutboundMessage {
        OutboundMessage {
            body: body.to_string(),
            message_group_id: group.to_string(),
            deduplication_id: dedup.to_string(),
        }
    }

    fn bodies(items: &[BatchItem]) -> Vec<&str> {
        items.iter().map(|i| i.body.as_str()).collect()
    }

    #[tokio::test]
    async fn send_receive_roundtrip_keeps_order() {
        let queue = InMemoryTaskQueue::new();
        for n in 0..3 {
            queue.send(message(&format!("m{n}"), "g", &format!("d{n}"))).await.unwrap();
        }

        let items = queue.receive(10).await.unwrap();
        assert_eq!(bodies(&items), vec!["m0", "m1", "m2"]);
        assert_eq!(queue.counts().await, QueueCounts { visible: 0, in_flight: 3 });
    }

    #[tokio::test]
    async fn duplicate_dedup_id_is_collapsed() {
        let queue = InMemoryTaskQueue::new();
        let first = queue.send(message("a", "g", "same")).await.unwrap();
        let second = queue.send(message("b", "g", "same")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(queue.counts().await.visible, 1);
        assert_eq!(bodies(&queue.receive(10).await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn dedup_window_expires() {
        struct SteppingClock(std::sync::Mutex<DateTime<Utc>>);
        impl Clock for SteppingClock {
            fn now(&self) -> DateTime<Utc> {
                let mut at = self.0.lock().unwrap();
                let now = *at;
                *at = now + Duration::minutes(6);
                now
            }
        }

        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let queue = InMemoryTaskQueue::with_clock(Arc::new(SteppingClock(std::sync::Mutex::new(start))));

        let first = queue.send(message("a", "g", "same")).await.unwrap();
        let second = queue.send(message("b", "g", "same")).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(queue.counts().await.visible, 2);
    }

    #[tokio::test]
    async fn in_flight_group_is_locked() {
        let queue = InMemoryTaskQueue::with_clock(Arc::new(FixedClock::new(Utc::now())));
        queue.send(message("g1-a", "g1", "1")).await.unwrap();
        queue.send(message("g1-b", "g1", "2")).await.unwrap();
        queue.send(message("g2-a", "g2", "3")).await.unwrap();

        let first = queue.receive(1).await.unwrap();
        assert_eq!(bodies(&first), vec!["g1-a"]);

        // g1 still has g1-a in flight, so only g2 is eligible
        let second = queue.receive(10).await.unwrap();
        assert_eq!(bodies(&second), vec!["g2-a"]);

        queue.delete(&first[0].receipt_handle).await.unwrap();
        let third = queue.receive(10).await.unwrap();
        assert_eq!(bodies(&third), vec!["g1-b"]);
    }

    #[tokio::test]
    async fn release_returns_message_to_head_of_group() {
        let queue = InMemoryTaskQueue::new();
        queue.send(message("m0", "g", "0")).await.unwrap();
        queue.send(message("m1", "g", "1")).await.unwrap();
        queue.send(message("m2", "g", "2")).await.unwrap();

        let items = queue.receive(2).await.unwrap();
        queue.release(&items[1].receipt_handle).await.unwrap();
        queue.release(&items[0].receipt_handle).await.unwrap();

        let again = queue.receive(10).await.unwrap();
        assert_eq!(bodies(&again), vec!["m0", "m1", "m2"]);
        assert_eq!(again[0].message_id, items[0].message_id);
    }

    #[tokio::test]
    async fn unknown_receipt_is_an_error() {
        let queue = InMemoryTaskQueue::new();
        assert!(matches!(
            queue.delete("nope").await,
            Err(QueueError::UnknownReceipt(_))
        ));
        assert!(matches!(
            queue.release("nope").await,
            Err(QueueError::UnknownReceipt(_))
        ));
    }

    #[tokio::test]
    async fn receive_on_empty_queue_returns_nothing() {
        let queue = InMemoryTaskQueue::new();
        assert!(queue.receive(10).await.unwrap().is_empty());
        assert!(queue.counts().await.is_drained());
    }
}
