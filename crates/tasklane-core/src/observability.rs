use serde::{Deserialize, Serialize};

/// Point-in-time message counts of a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Waiting to be received.
    pub visible: usize,
    /// Received but neither deleted nor released.
    pub in_flight: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.visible + self.in_flight
    }

    pub fn is_drained(&self) -> bool {
        self.total() == 0
    }
}
