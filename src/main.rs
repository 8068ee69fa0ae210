//! Jarvis CLI
//!
//! Runs the interactive assistant session, or invokes the memory surface
//! directly via subcommands.

use clap::{Parser, Subcommand};
use jarvis::session::ConsoleSpeech;
use jarvis::{
    config, ConversationLog, DurableStore, EchoRuntime, FactLedger, MemoryToolkit, Session,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Jarvis - voice-driven personal assistant with persistent memory
#[derive(Parser, Debug)]
#[command(name = "jarvis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (default: {data_dir}/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the persistent memory file
    #[arg(long)]
    memory_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive assistant session (default)
    Run {
        /// Initial utterance to handle before listening
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
    },

    /// Store a fact
    Remember { key: String, value: String },

    /// Look a fact up by scanning keys against the query text
    Recall { query: String },

    /// Remove a fact
    Forget { key: String },

    /// Show the recent conversation window
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// List remembered facts
    Facts {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Truncate the conversation log (facts are kept)
    Clear {
        /// Confirm the truncation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let data_dir = config::jarvis_home()?;
    let mut config = config::load(data_dir, cli.config.as_deref())?;
    if let Some(memory_file) = cli.memory_file {
        config = config.with_memory_file(memory_file);
    }
    config = config.with_verbose(cli.verbose);
    if config.verbose {
        info!("Effective configuration: {:?}", config);
    }

    let store = Arc::new(DurableStore::new(config.memory_file.clone()));

    match cli.command.unwrap_or(Command::Run { prompt: Vec::new() }) {
        Command::Run { prompt } => {
            info!("Starting Jarvis session");
            info!("Memory file: {:?}", config.memory_file);

            let speech = ConsoleSpeech::spawn();
            let mut session = Session::new(&config, store, speech, EchoRuntime);
            let initial = if prompt.is_empty() {
                None
            } else {
                Some(prompt.join(" "))
            };
            session.run(initial).await?;
        }
        Command::Remember { key, value } => {
            FactLedger::new(store).remember(&key, &value).await?;
            println!("Remembered '{}'.", key);
        }
        Command::Recall { query } => match FactLedger::new(store).recall(&query).await {
            Some((key, value)) => println!("{}: {}", key, value),
            None => println!("I don't remember anything about that."),
        },
        Command::Forget { key } => {
            if FactLedger::new(store).forget(&key).await? {
                println!("Forgotten '{}'.", key);
            } else {
                println!("No fact called '{}'.", key);
            }
        }
        Command::Recent { limit } => {
            println!("{}", MemoryToolkit::new(store).get_recent_conversations(limit).await);
        }
        Command::Facts { limit } => {
            println!("{}", MemoryToolkit::new(store).load_facts(limit).await);
        }
        Command::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to clear the conversation log without --yes");
            }
            ConversationLog::new(store).clear().await?;
            println!("Conversation log cleared.");
        }
    }

    Ok(())
}
