//! Jarvis - voice-driven personal assistant
//!
//! A thin orchestration layer that wires together:
//! - A speech front end (recognized utterances in, synthesized replies out)
//! - A persistent conversation/fact memory store
//! - A keyword-triggered command dispatcher
//! - Context injection into the instructions handed to an external agent runtime

pub mod config;
pub mod context;
pub mod intent;
pub mod memory;
pub mod session;
pub mod tools;

pub use context::ContextInjector;
pub use intent::{CommandIntent, IntentClassifier};
pub use memory::{
    ConversationEntry, ConversationLog, DurableStore, FactLedger, MemoryDocument, Speaker,
};
pub use session::{AgentRuntime, EchoRuntime, Session, SpeechFrontEnd};
pub use tools::MemoryToolkit;

use std::path::PathBuf;
use std::time::Duration;

/// Default bound on how many recent entries the context injector fetches
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Default budget for the injector's store fetch
pub const DEFAULT_CONTEXT_TIMEOUT_MS: u64 = 250;

/// Configuration for Jarvis
#[derive(Debug, Clone)]
pub struct JarvisConfig {
    /// Path to the persistent memory file
    pub memory_file: PathBuf,

    /// Data directory holding memory and config files
    pub data_dir: PathBuf,

    /// How many recent entries the context injector fetches
    pub recent_limit: usize,

    /// Budget for the injector's store fetch
    pub context_timeout: Duration,

    /// Whether memory context is injected into outbound instructions
    pub interceptor_enabled: bool,

    /// Extra memory-retrieval keywords merged into the built-in set
    pub extra_keywords: Vec<String>,

    /// Base instructions handed to the agent runtime
    pub base_instructions: String,

    /// Whether to show verbose output
    pub verbose: bool,
}

impl JarvisConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        let memory_file = data_dir.join("memory.json");
        Self {
            memory_file,
            data_dir,
            recent_limit: DEFAULT_RECENT_LIMIT,
            context_timeout: Duration::from_millis(DEFAULT_CONTEXT_TIMEOUT_MS),
            interceptor_enabled: true,
            extra_keywords: Vec::new(),
            base_instructions: "You are Jarvis, a helpful voice assistant.".to_string(),
            verbose: false,
        }
    }

    pub fn with_memory_file(mut self, path: PathBuf) -> Self {
        self.memory_file = path;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn with_context_timeout(mut self, timeout: Duration) -> Self {
        self.context_timeout = timeout;
        self
    }

    pub fn with_interceptor(mut self, enabled: bool) -> Self {
        self.interceptor_enabled = enabled;
        self
    }

    pub fn with_extra_keywords(mut self, keywords: Vec<String>) -> Self {
        self.extra_keywords = keywords;
        self
    }

    pub fn with_base_instructions(mut self, instructions: String) -> Self {
        self.base_instructions = instructions;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Result type for Jarvis operations
pub type Result<T> = std::result::Result<T, JarvisError>;

/// Errors that can occur in Jarvis
#[derive(Debug, thiserror::Error)]
pub enum JarvisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Speech front end error: {0}")]
    Speech(String),

    #[error("Agent runtime error: {0}")]
    AgentRuntime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
