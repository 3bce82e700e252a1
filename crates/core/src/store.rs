//! Conversation persistence trait.
//!
//! The store owns conversations and messages. Context frames are written
//! with an optimistic version stamp: a write carrying a stale
//! `expected_version` is rejected with [`StoreError::VersionConflict`].

use async_trait::async_trait;
use crate::context::ContextFrame;
use crate::error::StoreError;
use crate::message::{Conversation, ConversationId, Message};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Return the user's conversation with `id`, or start a new one with an
    /// empty context frame.
    async fn ensure_conversation(
        &self,
        user_id: &str,
        id: Option<&ConversationId>,
    ) -> Result<Conversation, StoreError>;

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, StoreError>;

    /// Append a message; returns it as stored.
    async fn save_message(&self, id: &ConversationId, message: Message) -> Result<Message, StoreError>;

    /// Replace the context frame if its version is still `expected_version`.
    /// Returns the new version.
    async fn update_context_frame(
        &self,
        id: &ConversationId,
        frame: &ContextFrame,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    async fn update_title(&self, id: &ConversationId, title: &str) -> Result<(), StoreError>;

    /// The last `limit` messages, oldest first.
    async fn recent_history(&self, id: &ConversationId, limit: usize) -> Result<Vec<Message>, StoreError>;
}
