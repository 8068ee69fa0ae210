//! Remember/recall/forget over the keyed fact table

use crate::memory::store::DurableStore;
use crate::Result;
use std::sync::Arc;

/// Fact operations over the durable store's keyed table.
///
/// Recall scans keys in the table's own iteration order, which is
/// lexicographic by key; the first key found inside the query text wins.
#[derive(Debug, Clone)]
pub struct FactLedger {
    store: Arc<DurableStore>,
}

impl FactLedger {
    pub fn new(store: Arc<DurableStore>) -> Self {
        Self { store }
    }

    /// Upsert: overwrites any prior value at that exact key.
    pub async fn remember(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.store
            .mutate(move |doc| {
                doc.facts.insert(key, value);
            })
            .await
    }

    /// First fact whose key is a case-sensitive substring of `query_text`,
    /// as a (key, value) pair. `None` when nothing matches.
    pub async fn recall(&self, query_text: &str) -> Option<(String, String)> {
        let doc = self.store.load().await;
        doc.facts
            .iter()
            .find(|(key, _)| query_text.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
    }

    /// Remove the key if present; reports whether a removal occurred.
    /// An absent key is not an error.
    pub async fn forget(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.store
            .mutate(move |doc| doc.facts.remove(&key).is_some())
            .await
    }

    /// Up to `limit` facts as (key, value) pairs, in key order.
    pub async fn list(&self, limit: usize) -> Vec<(String, String)> {
        let doc = self.store.load().await;
        doc.facts
            .iter()
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
