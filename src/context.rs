//! Context rendering and prompt injection
//!
//! When an utterance carries a memory-retrieval intent, the recent
//! conversation window is rendered into a delimited block and appended to
//! the outbound instructions before they reach the agent runtime. The
//! runtime sits on a latency-sensitive path, so the store fetch runs under
//! a short budget and every failure degrades to the unchanged prompt.

use crate::intent::IntentClassifier;
use crate::memory::{ConversationEntry, ConversationLog, Speaker};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Markers wrapping the injected block
pub const CONTEXT_HEADER: &str = "[MEMORY CONTEXT]";
pub const CONTEXT_FOOTER: &str = "[END MEMORY CONTEXT]";

/// Rendered in place of an empty conversation window
pub const NOTHING_REMEMBERED: &str = "Nothing remembered yet.";

/// Display label for a speaker inside the rendered block.
pub fn speaker_label(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => "You",
        Speaker::Assistant => "Jarvis",
    }
}

/// Render entries as one `label: text` line each, oldest first. An empty
/// window renders the nothing-remembered message instead of an empty block.
pub fn build_context_block(entries: &[ConversationEntry]) -> String {
    if entries.is_empty() {
        return NOTHING_REMEMBERED.to_string();
    }
    entries
        .iter()
        .map(|e| format!("{}: {}", speaker_label(e.speaker), e.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splices recent conversation into outbound instructions.
pub struct ContextInjector {
    log: ConversationLog,
    classifier: Arc<IntentClassifier>,
    recent_limit: usize,
    fetch_timeout: Duration,
    enabled: bool,
}

impl ContextInjector {
    pub fn new(
        log: ConversationLog,
        classifier: Arc<IntentClassifier>,
        recent_limit: usize,
        fetch_timeout: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            log,
            classifier,
            recent_limit,
            fetch_timeout,
            enabled,
        }
    }

    /// Return `base_prompt` with a delimited context section appended when
    /// `user_text` asks about memory; `base_prompt` unchanged otherwise.
    /// Never fails: a slow or failing fetch degrades to the unchanged
    /// prompt with a warning.
    pub async fn inject(&self, base_prompt: &str, user_text: &str) -> String {
        if !self.enabled || !self.classifier.should_retrieve_memory(user_text) {
            return base_prompt.to_string();
        }

        let entries = match tokio::time::timeout(
            self.fetch_timeout,
            self.log.get_recent(self.recent_limit),
        )
        .await
        {
            Ok(entries) => entries,
            Err(_) => {
                warn!(
                    "Memory fetch exceeded {:?}; sending prompt without context",
                    self.fetch_timeout
                );
                return base_prompt.to_string();
            }
        };

        let block = build_context_block(&entries);
        format!(
            "{}\n\n{}\n{}\n{}",
            base_prompt, CONTEXT_HEADER, block, CONTEXT_FOOTER
        )
    }
}
