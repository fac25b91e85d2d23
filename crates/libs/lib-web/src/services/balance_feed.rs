//! # Balance Feed
//!
//! Broadcast channel for live balance updates. The coin store remains the
//! source of truth; this feed only notifies connected clients that a balance
//! changed, and every event carries the authoritative post-change balance
//! read back from the store.

use lib_core::dto::BalanceEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Cloneable handle to the balance broadcast channel.
#[derive(Clone)]
pub struct BalanceFeed {
    tx: broadcast::Sender<BalanceEvent>,
}

impl BalanceFeed {
    /// Create a feed with the given channel capacity.
    ///
    /// Slow subscribers that fall more than `capacity` events behind see a
    /// lag error and should re-read the balance endpoint.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to balance events. Each subscriber filters by user id.
    pub fn subscribe(&self) -> broadcast::Receiver<BalanceEvent> {
        self.tx.subscribe()
    }

    /// Publish a balance change. A feed with no subscribers is not an error.
    pub fn publish(&self, event: BalanceEvent) {
        let receivers = self.tx.receiver_count();
        debug!(
            user_id = event.user_id,
            balance = event.balance,
            receivers,
            "[FEED] Balance event"
        );
        let _ = self.tx.send(event);
    }
}

impl Default for BalanceFeed {
    fn default() -> Self {
        Self::new(64)
    }
}
