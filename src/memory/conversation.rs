//! Append-only conversation logging over the durable store

use crate::memory::document::{ConversationEntry, Speaker};
use crate::memory::store::DurableStore;
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Text the speech front end reports when it heard nothing usable.
/// Appends carrying it (or nothing at all) are dropped before the store.
pub const NO_INPUT_SENTINEL: &str = "none";

/// Appends timestamped speaker/text entries to the durable store and reads
/// back the recent window.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    store: Arc<DurableStore>,
}

impl ConversationLog {
    pub fn new(store: Arc<DurableStore>) -> Self {
        Self { store }
    }

    /// Append one utterance. Empty text and the no-input sentinel are
    /// silently skipped; everything else is stamped with the current local
    /// time and written through one gated load-mutate-save.
    pub async fn append(&self, speaker: Speaker, text: &str) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_INPUT_SENTINEL) {
            debug!("Skipping conversation append with no usable text");
            return Ok(());
        }

        let entry = ConversationEntry::now(speaker, trimmed);
        self.store
            .mutate(move |doc| doc.conversation.push(entry))
            .await
    }

    /// The last `limit` entries in chronological order (oldest of the window
    /// first). A short log yields fewer entries; a zero limit yields none.
    pub async fn get_recent(&self, limit: usize) -> Vec<ConversationEntry> {
        if limit == 0 {
            return Vec::new();
        }
        let doc = self.store.load().await;
        let start = doc.conversation.len().saturating_sub(limit);
        doc.conversation[start..].to_vec()
    }

    /// Wholesale truncation of the conversation log. Facts are untouched.
    pub async fn clear(&self) -> Result<()> {
        self.store.mutate(|doc| doc.conversation.clear()).await
    }
}
