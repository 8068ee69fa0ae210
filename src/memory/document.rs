//! On-disk memory document and its read-compatibility shims
//!
//! Canonical schema:
//!
//! ```json
//! {
//!   "facts": { "<key>": "<value>" },
//!   "conversation": [
//!     { "speaker": "user", "text": "...", "ts": "2024-01-01T10:00:00+05:30" }
//!   ]
//! }
//! ```
//!
//! Older files are accepted on load: `entries` for the conversation array,
//! `timestamp` for the timestamp key, and `jarvis` for the assistant speaker.
//! When both a canonical key and its legacy twin are present, the canonical
//! key wins and the legacy one is ignored.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Who produced a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Parse a persisted speaker value. `jarvis` is the legacy spelling of
    /// the assistant; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "assistant" | "jarvis" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One timestamped utterance by either side of the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationEntry {
    pub speaker: Speaker,
    pub text: String,
    pub ts: DateTime<Local>,
}

impl ConversationEntry {
    /// Create an entry stamped with the current local time.
    pub fn now(speaker: Speaker, text: &str) -> Self {
        Self {
            speaker,
            text: text.to_string(),
            ts: Local::now(),
        }
    }

    /// Parse one entry from a persisted JSON object. Entries missing a
    /// speaker or text are skipped; a missing or malformed timestamp falls
    /// back to the load-time clock rather than failing the load.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let speaker = value
            .get("speaker")
            .and_then(|s| s.as_str())
            .and_then(Speaker::parse)?;
        let text = value.get("text").and_then(|t| t.as_str())?.to_string();
        let ts_raw = value
            .get("ts")
            .and_then(|t| t.as_str())
            .or_else(|| value.get("timestamp").and_then(|t| t.as_str()));
        Some(Self {
            speaker,
            text,
            ts: parse_ts(ts_raw),
        })
    }
}

/// Parse an ISO-8601 timestamp leniently: RFC 3339 first, then a naive
/// local timestamp, else the current time.
fn parse_ts(raw: Option<&str>) -> DateTime<Local> {
    raw.and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Local))
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .and_then(|n| Local.from_local_datetime(&n).single())
            })
    })
    .unwrap_or_else(Local::now)
}

/// The full persisted memory state: a keyed fact table plus an ordered,
/// append-only conversation log.
///
/// Facts live in a `BTreeMap` so iteration order (and thus first-match
/// recall) is deterministic: lexicographic by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryDocument {
    pub facts: BTreeMap<String, String>,
    pub conversation: Vec<ConversationEntry>,
}

impl MemoryDocument {
    /// Parse a serialized document. Returns `None` only when the content is
    /// not JSON at all; a JSON document with missing or corrupt collections
    /// yields those collections empty instead.
    pub fn parse(content: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(content).ok()?;
        Some(Self::from_value(&value))
    }

    /// Build a document from any JSON value, applying the legacy-key shims.
    pub fn from_value(value: &Value) -> Self {
        let facts = value
            .get("facts")
            .and_then(|f| f.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let conversation = value
            .get("conversation")
            .or_else(|| value.get("entries"))
            .and_then(|c| c.as_array())
            .map(|arr| arr.iter().filter_map(ConversationEntry::from_value).collect())
            .unwrap_or_default();

        Self {
            facts,
            conversation,
        }
    }
}
