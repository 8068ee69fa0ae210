//! Interactive assistant session
//!
//! Wires the speech front end, the intent dispatcher, the context injector,
//! and the external agent runtime together. Every utterance on either side
//! flows through the conversation log regardless of which branch handles it.

use crate::context::ContextInjector;
use crate::intent::{CommandIntent, IntentClassifier};
use crate::memory::{ConversationLog, DurableStore, FactLedger, Speaker, NO_INPUT_SENTINEL};
use crate::{JarvisConfig, JarvisError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Maximum agent-runtime attempts per reply
const MAX_RETRIES: u32 = 5;

/// Base wait between runtime attempts; grows linearly with the attempt
const BASE_WAIT: Duration = Duration::from_secs(3);

/// How many entries the recall-conversation flow reads back aloud
const SPOKEN_RECALL_LIMIT: usize = 5;

/// Recognized utterances in, synthesized replies out. Speech-to-text
/// quality and audio devices are the implementation's problem, not ours.
#[allow(async_fn_in_trait)]
pub trait SpeechFrontEnd {
    /// Next recognized utterance. `Ok(None)` means the input source is
    /// exhausted and the session should end.
    async fn listen(&mut self) -> Result<Option<String>>;

    /// Speak (or print) one reply.
    async fn say(&mut self, text: &str) -> Result<()>;
}

/// The external conversational-agent runtime, reduced to the one call the
/// session needs. `instructions` already carries any injected context.
#[allow(async_fn_in_trait)]
pub trait AgentRuntime {
    async fn generate_reply(&mut self, instructions: &str, user_text: &str) -> Result<String>;
}

/// Offline stand-in for the real runtime; echoes the utterance back.
#[derive(Debug, Default)]
pub struct EchoRuntime;

impl AgentRuntime for EchoRuntime {
    async fn generate_reply(&mut self, _instructions: &str, user_text: &str) -> Result<String> {
        Ok(format!("I heard you say: {}", user_text))
    }
}

/// Console speech front end: stdin lines in, stdout lines out.
pub struct ConsoleSpeech {
    input_rx: mpsc::Receiver<String>,
}

impl ConsoleSpeech {
    /// Spawn the blocking stdin reader thread and return the front end.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<String>(32);
        std::thread::spawn(move || {
            use std::io::BufRead;
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        Self { input_rx: rx }
    }
}

impl SpeechFrontEnd for ConsoleSpeech {
    async fn listen(&mut self) -> Result<Option<String>> {
        loop {
            match self.input_rx.recv().await {
                Some(line) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        return Ok(Some(trimmed.to_string()));
                    }
                }
                None => return Ok(None),
            }
        }
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        println!("Jarvis: {}", text);
        Ok(())
    }
}

/// Treat blank text and the no-input sentinel as "nothing was heard".
fn usable(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_INPUT_SENTINEL) {
        None
    } else {
        Some(trimmed)
    }
}

/// One interactive assistant session.
pub struct Session<S, R> {
    speech: S,
    runtime: R,
    log: ConversationLog,
    facts: FactLedger,
    classifier: Arc<IntentClassifier>,
    injector: ContextInjector,
    base_instructions: String,
}

impl<S: SpeechFrontEnd, R: AgentRuntime> Session<S, R> {
    pub fn new(config: &JarvisConfig, store: Arc<DurableStore>, speech: S, runtime: R) -> Self {
        let classifier = Arc::new(
            IntentClassifier::new().with_extra_keywords(&config.extra_keywords),
        );
        let injector = ContextInjector::new(
            ConversationLog::new(store.clone()),
            classifier.clone(),
            config.recent_limit,
            config.context_timeout,
            config.interceptor_enabled,
        );
        Self {
            speech,
            runtime,
            log: ConversationLog::new(store.clone()),
            facts: FactLedger::new(store),
            classifier,
            injector,
            base_instructions: config.base_instructions.clone(),
        }
    }

    /// Run until the input source is exhausted or the user asks to stop.
    /// An optional initial prompt is handled before the listen loop.
    pub async fn run(&mut self, initial_prompt: Option<String>) -> Result<()> {
        self.say("System online. How can I help you?").await?;

        if let Some(prompt) = initial_prompt {
            if let Some(text) = usable(&prompt) {
                let text = text.to_string();
                self.log.append(Speaker::User, &text).await?;
                if !self.handle(&text).await? {
                    return Ok(());
                }
            }
        }

        loop {
            let Some(raw) = self.speech.listen().await? else {
                break;
            };
            let Some(text) = usable(&raw) else {
                continue;
            };
            let text = text.to_string();
            self.log.append(Speaker::User, &text).await?;
            if !self.handle(&text).await? {
                break;
            }
        }
        Ok(())
    }

    /// Dispatch one utterance; returns false when the session should end.
    async fn handle(&mut self, text: &str) -> Result<bool> {
        let intent = self.classifier.classify(text);
        info!("Classified utterance as {}", intent);

        match intent {
            CommandIntent::RememberFact => self.remember_flow().await?,
            CommandIntent::RecallConversation => self.recall_conversation().await?,
            CommandIntent::ForgetFact => self.forget_flow().await?,
            CommandIntent::RecallFact => self.recall_fact(text).await?,
            CommandIntent::Shutdown => {
                self.say("Okay, shutting down. Goodbye!").await?;
                return Ok(false);
            }
            CommandIntent::Chat => {
                let reply = self.reply_with_retry(text).await?;
                self.say(&reply).await?;
            }
        }
        Ok(true)
    }

    /// Speak a reply and log it as an assistant turn.
    async fn say(&mut self, text: &str) -> Result<()> {
        self.speech.say(text).await?;
        self.log.append(Speaker::Assistant, text).await
    }

    /// Listen for one follow-up answer, logging anything usable.
    async fn follow_up(&mut self) -> Result<Option<String>> {
        let Some(raw) = self.speech.listen().await? else {
            return Ok(None);
        };
        match usable(&raw) {
            Some(text) => {
                let text = text.to_string();
                self.log.append(Speaker::User, &text).await?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Two-step voice flow: ask what to remember, then the details.
    async fn remember_flow(&mut self) -> Result<()> {
        self.say("Okay, what should I remember?").await?;
        let Some(key) = self.follow_up().await? else {
            return self.say("Sorry, I did not catch what to remember.").await;
        };

        self.say(&format!("Okay, what should I remember about '{}'?", key))
            .await?;
        let Some(value) = self.follow_up().await? else {
            return self.say("Sorry, I did not catch the details.").await;
        };

        self.facts.remember(&key, &value).await?;
        self.say("Okay, I will remember that.").await
    }

    /// Read the recent window back aloud, oldest first.
    async fn recall_conversation(&mut self) -> Result<()> {
        let entries = self.log.get_recent(SPOKEN_RECALL_LIMIT).await;
        if entries.is_empty() {
            return self
                .say("Sorry, I do not remember any conversation yet.")
                .await;
        }

        self.say("Okay, here is what we talked about recently.").await?;
        for entry in entries {
            let line = match entry.speaker {
                Speaker::User => format!("You said, {}", entry.text),
                Speaker::Assistant => format!("I said, {}", entry.text),
            };
            self.say(&line).await?;
        }
        Ok(())
    }

    async fn forget_flow(&mut self) -> Result<()> {
        self.say("Which fact should I forget?").await?;
        let Some(key) = self.follow_up().await? else {
            return self.say("Sorry, I did not catch that.").await;
        };

        if self.facts.forget(&key).await? {
            self.say(&format!("Okay, I have forgotten '{}'.", key)).await
        } else {
            self.say(&format!("I do not remember any fact called '{}'.", key))
                .await
        }
    }

    async fn recall_fact(&mut self, query: &str) -> Result<()> {
        match self.facts.recall(query).await {
            Some((key, value)) => {
                self.say(&format!("I remember that {}: {}", key, value)).await
            }
            None => {
                self.say("Sorry, I do not remember anything about that.")
                    .await
            }
        }
    }

    /// Ask the runtime for a reply, injecting context each attempt, with
    /// linear backoff between failures. Exhausting the retries surfaces
    /// the last error.
    async fn reply_with_retry(&mut self, user_text: &str) -> Result<String> {
        let mut last_err = None;
        for attempt in 1..=MAX_RETRIES {
            let instructions = self
                .injector
                .inject(&self.base_instructions, user_text)
                .await;
            match self.runtime.generate_reply(&instructions, user_text).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    warn!(
                        "Agent runtime failed (attempt {}/{}): {}",
                        attempt, MAX_RETRIES, e
                    );
                    last_err = Some(e);
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(BASE_WAIT * attempt).await;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| JarvisError::AgentRuntime("no attempts were made".to_string())))
    }
}
