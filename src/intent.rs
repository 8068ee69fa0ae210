//! Keyword-triggered intent classification
//!
//! Raw utterances are classified exactly once into a tagged intent, and the
//! session loop branches on that tag; no string matching leaks into call
//! sites. A separate predicate decides whether an utterance carries a
//! memory-retrieval intent, which gates context injection.

use regex::Regex;

/// Memory-retrieval keywords, Hindi and English. Matching is
/// case-insensitive substring; configuration can extend the set but not
/// change the matching semantics.
const MEMORY_KEYWORDS: &[&str] = &[
    "याद है",
    "पहले क्या",
    "बात हुई",
    "पिछली",
    "history",
    "memory",
    "पुरानी बातें",
    "मेमोरी",
    "याद रखते",
    "पहले की",
    "पिछली बातचीत",
    "कल क्या",
    "what did i say",
    "remember",
    "recall",
    "past conversation",
    "पढ़ कर सुनाओ",
    "बताओ क्या",
    "मेरी बातें",
    "previous talk",
];

/// What the user asked for, decided once per utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    /// Store a new fact (two-step voice flow: key, then value)
    RememberFact,

    /// Read back the recent conversation window
    RecallConversation,

    /// Remove a fact by key
    ForgetFact,

    /// Look a fact up by scanning keys against the utterance
    RecallFact,

    /// End the session
    Shutdown,

    /// Anything else: hand the utterance to the agent runtime
    Chat,
}

impl std::fmt::Display for CommandIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandIntent::RememberFact => write!(f, "remember_fact"),
            CommandIntent::RecallConversation => write!(f, "recall_conversation"),
            CommandIntent::ForgetFact => write!(f, "forget_fact"),
            CommandIntent::RecallFact => write!(f, "recall_fact"),
            CommandIntent::Shutdown => write!(f, "shutdown"),
            CommandIntent::Chat => write!(f, "chat"),
        }
    }
}

/// Classifies utterances using fixed pattern tables compiled once.
///
/// Pure and side-effect free; no I/O anywhere in this module.
pub struct IntentClassifier {
    memory_keywords: Vec<String>,
    remember_patterns: Vec<Regex>,
    recall_conversation_patterns: Vec<Regex>,
    forget_patterns: Vec<Regex>,
    recall_fact_patterns: Vec<Regex>,
    shutdown_patterns: Vec<Regex>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            memory_keywords: MEMORY_KEYWORDS.iter().map(|k| k.to_lowercase()).collect(),
            remember_patterns: compile(&["याद रखो", "याद रखना", r"(?i)remember (this|that)"]),
            recall_conversation_patterns: compile(&[
                "पिछली बात",
                "पिछली बातचीत",
                "क्या बात हुई",
                r"(?i)previous (conversation|talk)",
            ]),
            forget_patterns: compile(&["भूल जाओ", "भूल जाना", r"(?i)\bforget\b"]),
            recall_fact_patterns: compile(&[
                "क्या है",
                "कब है",
                "बताओ",
                "कौन है",
                r"(?i)\bwhat is\b",
                r"(?i)\bwhen is\b",
                r"(?i)\bwho is\b",
            ]),
            shutdown_patterns: compile(&["band karo", "बंद करो", r"(?i)\bexit\b", r"(?i)\bstop\b"]),
        }
    }

    /// Merge configured keywords into the memory-retrieval set.
    pub fn with_extra_keywords(mut self, extra: &[String]) -> Self {
        self.memory_keywords
            .extend(extra.iter().map(|k| k.to_lowercase()));
        self
    }

    /// True iff `text` is non-empty and contains at least one
    /// memory-retrieval keyword (case-insensitive substring).
    pub fn should_retrieve_memory(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.memory_keywords.iter().any(|kw| lower.contains(kw))
    }

    /// Classify one utterance. Checked in the same priority order the
    /// assistant dispatches in: remember, recall-conversation, forget,
    /// recall-fact, shutdown, chat.
    pub fn classify(&self, text: &str) -> CommandIntent {
        if matches_any(&self.remember_patterns, text) {
            CommandIntent::RememberFact
        } else if matches_any(&self.recall_conversation_patterns, text) {
            CommandIntent::RecallConversation
        } else if matches_any(&self.forget_patterns, text) {
            CommandIntent::ForgetFact
        } else if matches_any(&self.recall_fact_patterns, text) {
            CommandIntent::RecallFact
        } else if matches_any(&self.shutdown_patterns, text) {
            CommandIntent::Shutdown
        } else {
            CommandIntent::Chat
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("intent pattern must compile"))
        .collect()
}

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}
