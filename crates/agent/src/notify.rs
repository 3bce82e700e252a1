//! Thinking notifications — per-user push channel for "working on it" events.
//!
//! A transport layer calls [`ThinkingRegistry::connect`] when a user's live
//! connection opens and forwards whatever arrives on the returned receiver.
//! The pipeline only ever calls [`ThinkingRegistry::notify`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Buffered events per user before `notify` starts dropping.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingEvent {
    pub user_id: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Connected users and their event senders.
#[derive(Clone, Default)]
pub struct ThinkingRegistry {
    senders: Arc<DashMap<String, mpsc::Sender<ThinkingEvent>>>,
}

impl ThinkingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `user_id`, replacing any earlier connection.
    pub fn connect(&self, user_id: &str) -> mpsc::Receiver<ThinkingEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        if self.senders.insert(user_id.to_string(), tx).is_some() {
            debug!(user_id, "Replaced existing thinking connection");
        }
        rx
    }

    pub fn disconnect(&self, user_id: &str) {
        self.senders.remove(user_id);
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.senders.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Push a message to `user_id`. Returns whether it was delivered.
    pub fn notify(&self, user_id: &str, message: &str) -> bool {
        let Some(sender) = self.senders.get(user_id).map(|s| s.clone()) else {
            warn!(user_id, "No thinking connection for user");
            return false;
        };

        let event = ThinkingEvent {
            user_id: user_id.to_string(),
            message: message.to_string(),
            at: Utc::now(),
        };

        match sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(user_id, "Thinking channel full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(user_id, "Thinking receiver gone, disconnecting");
                self.senders
                    .remove_if(user_id, |_, s| s.same_channel(&sender));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connected_user_receives_events() {
        let registry = ThinkingRegistry::new();
        let mut rx = registry.connect("u1");

        assert!(registry.notify("u1", "Thinking..."));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.user_id, "u1");
        assert_eq!(event.message, "Thinking...");
    }

    #[test]
    fn unknown_user_is_not_delivered() {
        let registry = ThinkingRegistry::new();
        assert!(!registry.notify("ghost", "Thinking..."));
        assert!(registry.is_empty());
    }

    #[test]
    fn disconnect_removes_entry() {
        let registry = ThinkingRegistry::new();
        let _rx = registry.connect("u1");
        assert!(registry.is_connected("u1"));
        registry.disconnect("u1");
        assert!(!registry.is_connected("u1"));
        assert!(!registry.notify("u1", "x"));
    }

    #[tokio::test]
    async fn reconnect_replaces_old_receiver() {
        let registry = ThinkingRegistry::new();
        let mut old = registry.connect("u1");
        let mut new = registry.connect("u1");
        assert_eq!(registry.len(), 1);

        assert!(registry.notify("u1", "hello"));
        assert_eq!(new.recv().await.unwrap().message, "hello");
        assert!(old.recv().await.is_none());
    }

    #[test]
    fn dropped_receiver_is_cleaned_up() {
        let registry = ThinkingRegistry::new();
        drop(registry.connect("u1"));
        assert!(!registry.notify("u1", "x"));
        assert!(!registry.is_connected("u1"));
    }

    #[test]
    fn clones_share_connections() {
        let registry = ThinkingRegistry::new();
        let other = registry.clone();
        let _rx = registry.connect("u1");
        assert!(other.is_connected("u1"));
    }
}
