//! Retrieval facade: the tool surface the agent runtime invokes
//!
//! The external runtime registers these operations as named tools and treats
//! every returned string as a final result; there is no structured error
//! channel. Each operation therefore answers with a human-readable string —
//! failures included — and never raises across the tool boundary. Every
//! call is stateless (load-mutate-save against the store) and independently
//! retryable.

use crate::context::speaker_label;
use crate::memory::{ConversationLog, DurableStore, FactLedger, MemoryDocument, Speaker};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Tool names as registered with the agent runtime
pub mod names {
    pub const GET_RECENT_CONVERSATIONS: &str = "get_recent_conversations";
    pub const ADD_MEMORY_ENTRY: &str = "add_memory_entry";
    pub const LOAD_FACTS: &str = "load_facts";
    pub const SAVE_MEMORY: &str = "save_memory";
}

/// Default window when a tool call omits `limit`
const DEFAULT_TOOL_LIMIT: i64 = 10;

/// The callable memory surface for the agent runtime and the CLI.
#[derive(Debug, Clone)]
pub struct MemoryToolkit {
    log: ConversationLog,
    facts: FactLedger,
    store: Arc<DurableStore>,
}

impl MemoryToolkit {
    pub fn new(store: Arc<DurableStore>) -> Self {
        Self {
            log: ConversationLog::new(store.clone()),
            facts: FactLedger::new(store.clone()),
            store,
        }
    }

    /// Human-readable summary of the last `limit` conversation entries.
    /// Negative limits are treated as zero.
    pub async fn get_recent_conversations(&self, limit: i64) -> String {
        let entries = self.log.get_recent(limit.max(0) as usize).await;
        if entries.is_empty() {
            return "No conversation remembered yet.".to_string();
        }
        let lines = entries
            .iter()
            .map(|e| format!("- {}: {}", speaker_label(e.speaker), e.text))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Recent conversation:\n{}", lines)
    }

    /// Append one entry to the conversation log. Unknown speakers and store
    /// failures come back as error strings.
    pub async fn add_memory_entry(&self, speaker: &str, text: &str) -> String {
        let Some(parsed) = Speaker::parse(speaker) else {
            return format!("Error adding entry: unknown speaker '{}'", speaker);
        };
        match self.log.append(parsed, text).await {
            Ok(()) => format!("Added a '{}' entry to the conversation log", parsed),
            Err(e) => {
                warn!("add_memory_entry failed: {}", e);
                format!("Error adding entry: {}", e)
            }
        }
    }

    /// Up to `limit` remembered facts, one bullet per fact.
    pub async fn load_facts(&self, limit: i64) -> String {
        let facts = self.facts.list(limit.max(0) as usize).await;
        if facts.is_empty() {
            return "No facts remembered yet.".to_string();
        }
        let lines = facts
            .iter()
            .map(|(k, v)| format!("• {}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Remembered facts:\n{}", lines)
    }

    /// Bulk overwrite of the whole memory document from arbitrary JSON.
    ///
    /// This bypasses the append/upsert contracts — whatever was on disk is
    /// replaced wholesale, with only the write gate serializing it against
    /// other mutations. Use sparingly.
    pub async fn save_memory(&self, data: &Value) -> String {
        let doc = MemoryDocument::from_value(data);
        match self.store.replace(&doc).await {
            Ok(()) => "Memory saved successfully".to_string(),
            Err(e) => {
                warn!("save_memory failed: {}", e);
                format!("Error saving memory: {}", e)
            }
        }
    }

    /// Dispatch a tool call by registered name. Unknown names come back as
    /// an error string like any other tool failure.
    pub async fn invoke(&self, name: &str, args: &Value) -> String {
        match name {
            names::GET_RECENT_CONVERSATIONS => {
                self.get_recent_conversations(limit_arg(args)).await
            }
            names::ADD_MEMORY_ENTRY => {
                let speaker = str_arg(args, "speaker");
                let text = str_arg(args, "text");
                self.add_memory_entry(speaker, text).await
            }
            names::LOAD_FACTS => self.load_facts(limit_arg(args)).await,
            names::SAVE_MEMORY => {
                let data = args.get("data").unwrap_or(args);
                self.save_memory(data).await
            }
            _ => format!("Error: unknown tool '{}'", name),
        }
    }
}

fn limit_arg(args: &Value) -> i64 {
    args.get("limit")
        .and_then(|l| l.as_i64())
        .unwrap_or(DEFAULT_TOOL_LIMIT)
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or("")
}
