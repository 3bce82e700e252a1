//! Per-conversation turn serialization.
//!
//! Turns on the same conversation run one at a time; turns on different
//! conversations do not wait on each other. Entries are dropped from the map
//! once no turn holds or awaits them.

use std::sync::Arc;

use dashmap::DashMap;
use fieldvoice_core::message::ConversationId;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = DashMap<ConversationId, Arc<Mutex<()>>>;

#[derive(Clone, Default)]
pub struct ConversationLocks {
    locks: Arc<LockMap>,
}

/// Held for the duration of one turn. Releases on drop.
pub struct TurnGuard {
    conversation_id: ConversationId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn holds `conversation_id`.
    pub async fn acquire(&self, conversation_id: &ConversationId) -> TurnGuard {
        let lock = self
            .locks
            .entry(conversation_id.clone())
            .or_default()
            .clone();

        let guard = lock.lock_owned().await;
        trace!(conversation_id = %conversation_id, "Turn lock acquired");

        TurnGuard {
            conversation_id: conversation_id.clone(),
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// Conversations with a turn running or queued.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody holds or awaits it.
        self.locks
            .remove_if(&self.conversation_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
