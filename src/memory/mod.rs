//! Memory subsystem for Jarvis
//!
//! One JSON document on disk holds everything the assistant remembers: a
//! keyed fact table and an ordered conversation log. The durable store owns
//! the file; the conversation log and fact ledger are the only write paths.

mod conversation;
mod document;
mod facts;
mod store;

pub use conversation::{ConversationLog, NO_INPUT_SENTINEL};
pub use document::{ConversationEntry, MemoryDocument, Speaker};
pub use facts::FactLedger;
pub use store::DurableStore;
