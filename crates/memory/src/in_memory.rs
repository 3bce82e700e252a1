//! In-memory conversation store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use fieldvoice_core::context::ContextFrame;
use fieldvoice_core::error::StoreError;
use fieldvoice_core::message::{Conversation, ConversationId, Message};
use fieldvoice_core::store::ConversationStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct Record {
    conversation: Conversation,
    messages: Vec<Message>,
}

/// Conversations and their messages held in a map.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<ConversationId, Record>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Every message of a conversation, oldest first.
    pub async fn messages(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        let records = self.records.read().await;
        let record = records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(record.messages.clone())
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn ensure_conversation(
        &self,
        user_id: &str,
        id: Option<&ConversationId>,
    ) -> Result<Conversation, StoreError> {
        let mut records = self.records.write().await;

        if let Some(id) = id {
            if let Some(record) = records.get(id) {
                if record.conversation.user_id != user_id {
                    return Err(StoreError::NotFound(id.to_string()));
                }
                return Ok(record.conversation.clone());
            }
        }

        let mut conversation = Conversation::new(user_id);
        if let Some(id) = id {
            conversation.id = id.clone();
        }
        debug!(conversation_id = %conversation.id, user_id, "Created conversation");
        records.insert(
            conversation.id.clone(),
            Record {
                conversation: conversation.clone(),
                messages: Vec::new(),
            },
        );
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &ConversationId) -> Result<Conversation, StoreError> {
        self.records
            .read()
            .await
            .get(id)
            .map(|r| r.conversation.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_message(&self, id: &ConversationId, message: Message) -> Result<Message, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.messages.push(message.clone());
        record.conversation.updated_at = Utc::now();
        Ok(message)
    }

    async fn update_context_frame(
        &self,
        id: &ConversationId,
        frame: &ContextFrame,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let conversation = &mut record.conversation;
        if conversation.frame_version != expected_version {
            return Err(StoreError::VersionConflict {
                conversation_id: id.to_string(),
                expected: expected_version,
                found: conversation.frame_version,
            });
        }

        conversation.context_frame = frame.clone();
        conversation.frame_version += 1;
        conversation.updated_at = Utc::now();
        Ok(conversation.frame_version)
    }

    async fn update_title(&self, id: &ConversationId, title: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.conversation.title = Some(title.to_string());
        Ok(())
    }

    async fn recent_history(&self, id: &ConversationId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let records = self.records.read().await;
        let record = records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let start = record.messages.len().saturating_sub(limit);
        Ok(record.messages[start..].to_vec())
    }
}
