//! Versioned access to a conversation's context frame.
//!
//! A turn reads a [`FrameSnapshot`] once and writes back once. The write
//! applies its updates on top of the snapshot and is accepted only if the
//! stored version still matches the snapshot's; otherwise the store rejects
//! it with `VersionConflict` and the turn fails rather than clobbering a
//! concurrent writer.

use std::sync::Arc;

use fieldvoice_core::context::{ContextFrame, ContextUpdate};
use fieldvoice_core::message::{Conversation, ConversationId};
use fieldvoice_core::store::ConversationStore;
use fieldvoice_core::Result;
use tracing::debug;

/// A frame together with the version it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
    pub frame: ContextFrame,
    pub version: u64,
}

impl FrameSnapshot {
    pub fn of(conversation: &Conversation) -> Self {
        Self {
            frame: conversation.context_frame.clone(),
            version: conversation.frame_version,
        }
    }
}

#[derive(Clone)]
pub struct ContextFrameStore {
    store: Arc<dyn ConversationStore>,
}

impl ContextFrameStore {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn read(&self, id: &ConversationId) -> Result<FrameSnapshot> {
        let conversation = self.store.get_conversation(id).await?;
        Ok(FrameSnapshot::of(&conversation))
    }

    /// Apply `updates` in order on top of `base` and persist the result.
    ///
    /// With no updates nothing is written and `base` is returned as-is.
    pub async fn write(
        &self,
        id: &ConversationId,
        base: &FrameSnapshot,
        updates: &[ContextUpdate],
    ) -> Result<FrameSnapshot> {
        if updates.is_empty() {
            return Ok(base.clone());
        }

        let mut frame = base.frame.clone();
        frame.apply_all(updates);

        let version = self
            .store
            .update_context_frame(id, &frame, base.version)
            .await?;

        debug!(
            conversation_id = %id,
            tasks = ?updates.iter().map(|u| u.task().as_str()).collect::<Vec<_>>(),
            version,
            "Context frame written"
        );

        Ok(FrameSnapshot { frame, version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldvoice_core::chemical::{ChemicalMatch, ChemicalSearchResult};
    use fieldvoice_core::context::Entity;
    use fieldvoice_core::error::StoreError;
    use fieldvoice_core::Error;
    use fieldvoice_memory::InMemoryStore;

    async fn setup() -> (ContextFrameStore, ConversationId) {
        let store = Arc::new(InMemoryStore::new());
        let conv = store.ensure_conversation("u1", None).await.unwrap();
        (ContextFrameStore::new(store), conv.id)
    }

    #[tokio::test]
    async fn write_then_read() {
        let (frames, id) = setup().await;
        let base = frames.read(&id).await.unwrap();
        assert!(base.frame.is_empty());

        let written = frames
            .write(&id, &base, &[ContextUpdate::Crop(Entity::named("maize"))])
            .await
            .unwrap();
        assert_eq!(written.version, base.version + 1);

        let read = frames.read(&id).await.unwrap();
        assert_eq!(read, written);
    }

    #[tokio::test]
    async fn chemical_write_is_trimmed_and_focused() {
        let (frames, id) = setup().await;
        let base = frames.read(&id).await.unwrap();
        let result = ChemicalSearchResult::found(
            "x",
            vec![
                ChemicalMatch::new("1", "ProductX", 0.9).with_description("full label"),
                ChemicalMatch::new("2", "ProductY", 0.8).with_description("full label"),
            ],
            None,
        );
        frames
            .write(&id, &base, &[ContextUpdate::Chemical(result)])
            .await
            .unwrap();

        let read = frames.read(&id).await.unwrap();
        let chem = read.frame.chemical.unwrap();
        assert!(chem.products.iter().all(|p| p.description.is_none()));
        assert_eq!(read.frame.best_match.unwrap().name, "ProductX");
    }

    #[tokio::test]
    async fn empty_update_list_writes_nothing() {
        let (frames, id) = setup().await;
        let base = frames.read(&id).await.unwrap();
        let out = frames.write(&id, &base, &[]).await.unwrap();
        assert_eq!(out, base);
        assert_eq!(frames.read(&id).await.unwrap().version, base.version);
    }

    #[tokio::test]
    async fn write_from_stale_snapshot_is_rejected() {
        let (frames, id) = setup().await;
        let stale = frames.read(&id).await.unwrap();

        frames
            .write(&id, &stale, &[ContextUpdate::Crop(Entity::named("maize"))])
            .await
            .unwrap();

        let err = frames
            .write(&id, &stale, &[ContextUpdate::Crop(Entity::named("cabbage"))])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::VersionConflict { .. })));

        let read = frames.read(&id).await.unwrap();
        assert_eq!(read.frame.crop.unwrap().name, "maize");
    }
}
