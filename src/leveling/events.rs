//! Level-up notifications
//!
//! The ledger publishes through a [`LevelUpObserver`]. [`LevelUpBus`] is the
//! stock observer: a broadcast channel any number of consumers can subscribe to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber before old ones are dropped
const DEFAULT_CAPACITY: usize = 64;

/// A user's derived level strictly increased
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpEvent {
    pub user_id: u64,
    pub old_level: u32,
    pub new_level: u32,
    pub timestamp: DateTime<Utc>,
}

/// Receives level-up events. Implementations must not block.
pub trait LevelUpObserver: Send + Sync {
    fn on_level_up(&self, event: &LevelUpEvent);
}

/// Fire-and-forget broadcast of level-up events
#[derive(Debug, Clone)]
pub struct LevelUpBus {
    sender: broadcast::Sender<LevelUpEvent>,
}

impl LevelUpBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LevelUpEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LevelUpBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LevelUpObserver for LevelUpBus {
    fn on_level_up(&self, event: &LevelUpEvent) {
        // Never waits on subscribers; a lagging receiver loses its oldest events
        match self.sender.send(event.clone()) {
            Ok(receivers) => tracing::debug!(
                user_id = event.user_id,
                receivers,
                "Level-up event published"
            ),
            Err(_) => tracing::warn!(
                user_id = event.user_id,
                new_level = event.new_level,
                "Level-up event dropped, no subscribers"
            ),
        }
    }
}
