//! Integration tests for the Jarvis memory subsystem

use jarvis::{
    ContextInjector, ConversationLog, DurableStore, FactLedger, IntentClassifier, MemoryToolkit,
    Speaker,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn store_in(temp_dir: &TempDir) -> Arc<DurableStore> {
    Arc::new(DurableStore::new(temp_dir.path().join("memory.json")))
}

/// Loading a non-existent file yields an empty document, twice in a row,
/// and loading alone never creates the file.
#[tokio::test]
async fn test_idempotent_load_of_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("memory.json");
    let store = DurableStore::new(path.clone());

    for _ in 0..2 {
        let doc = store.load().await;
        assert!(doc.facts.is_empty());
        assert!(doc.conversation.is_empty());
    }
    assert!(!path.exists());
}

/// `save(load())` with no mutation in between leaves the file content
/// byte-for-byte identical.
#[tokio::test]
async fn test_unmutated_save_is_a_noop() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);
    let log = ConversationLog::new(store.clone());
    let facts = FactLedger::new(store.clone());

    log.append(Speaker::User, "hello").await.unwrap();
    facts.remember("capital", "Delhi").await.unwrap();

    let before = tokio::fs::read(store.file_path()).await.unwrap();
    let doc = store.load().await;
    store.save(&doc).await.unwrap();
    let after = tokio::fs::read(store.file_path()).await.unwrap();
    assert_eq!(before, after);
}

/// Empty text and the no-input sentinel never create entries; real text
/// appends exactly one.
#[tokio::test]
async fn test_append_skip_rule() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);
    let log = ConversationLog::new(store.clone());

    log.append(Speaker::User, "").await.unwrap();
    log.append(Speaker::User, "None").await.unwrap();
    assert_eq!(store.load().await.conversation.len(), 0);

    log.append(Speaker::User, "hello").await.unwrap();
    let doc = store.load().await;
    assert_eq!(doc.conversation.len(), 1);
    assert_eq!(doc.conversation[0].text, "hello");
}

/// With 12 entries logged, the recency window returns exactly the last 5
/// in original order, and a zero limit returns nothing.
#[tokio::test]
async fn test_recency_window() {
    let temp_dir = TempDir::new().unwrap();
    let log = ConversationLog::new(store_in(&temp_dir));

    for i in 0..12 {
        log.append(Speaker::User, &format!("message {}", i))
            .await
            .unwrap();
    }

    let recent = log.get_recent(5).await;
    assert_eq!(recent.len(), 5);
    let texts: Vec<&str> = recent.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["message 7", "message 8", "message 9", "message 10", "message 11"]
    );

    assert!(log.get_recent(0).await.is_empty());
    assert_eq!(log.get_recent(100).await.len(), 12);
}

/// N concurrent appends with distinct texts all land: no loss, no
/// duplicates, and every append observed by the final load.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_lose_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);

    let mut handles = Vec::new();
    for i in 0..32 {
        let log = ConversationLog::new(store.clone());
        let speaker = if i % 2 == 0 {
            Speaker::User
        } else {
            Speaker::Assistant
        };
        handles.push(tokio::spawn(async move {
            log.append(speaker, &format!("turn {}", i)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let doc = store.load().await;
    assert_eq!(doc.conversation.len(), 32);

    let mut texts: Vec<String> = doc.conversation.iter().map(|e| e.text.clone()).collect();
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), 32);
}

/// A fact write racing conversation appends drops neither.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_writers_do_not_interleave() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);

    let mut handles = Vec::new();
    for i in 0..8 {
        let log = ConversationLog::new(store.clone());
        handles.push(tokio::spawn(async move {
            log.append(Speaker::User, &format!("turn {}", i)).await.unwrap();
        }));
        let facts = FactLedger::new(store.clone());
        handles.push(tokio::spawn(async move {
            facts
                .remember(&format!("fact {}", i), "value")
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let doc = store.load().await;
    assert_eq!(doc.conversation.len(), 8);
    assert_eq!(doc.facts.len(), 8);
}

/// Fact overwrite keeps exactly one value at the key.
#[tokio::test]
async fn test_fact_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let facts = FactLedger::new(store_in(&temp_dir));

    facts.remember("capital", "Delhi").await.unwrap();
    facts.remember("capital", "Mumbai").await.unwrap();

    let all = facts.list(10).await;
    assert_eq!(all, vec![("capital".to_string(), "Mumbai".to_string())]);
}

/// Recall is substring-over-keys; a miss is `None`.
#[tokio::test]
async fn test_recall_substring_match() {
    let temp_dir = TempDir::new().unwrap();
    let facts = FactLedger::new(store_in(&temp_dir));
    facts.remember("meeting", "3pm").await.unwrap();

    let hit = facts.recall("when is the meeting today").await;
    assert_eq!(hit.map(|(_, v)| v), Some("3pm".to_string()));
    assert_eq!(facts.recall("no match here").await, None);
}

/// The classifier decisions the injection path rides on.
#[test]
fn test_classifier_decisions() {
    let classifier = IntentClassifier::new();
    assert!(classifier.should_retrieve_memory("पहले क्या बात हुई?"));
    assert!(!classifier.should_retrieve_memory("turn on the lights"));
    assert!(!classifier.should_retrieve_memory(""));
}

/// Injection is the identity for non-memory utterances and appends a
/// delimited block for memory ones.
#[tokio::test]
async fn test_context_injection_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);
    let log = ConversationLog::new(store.clone());
    log.append(Speaker::User, "my name is Asha").await.unwrap();
    log.append(Speaker::Assistant, "nice to meet you, Asha")
        .await
        .unwrap();

    let injector = ContextInjector::new(
        ConversationLog::new(store),
        Arc::new(IntentClassifier::new()),
        10,
        Duration::from_millis(250),
        true,
    );

    let prompt = "base instructions";
    assert_eq!(injector.inject(prompt, "turn on the lights").await, prompt);

    let merged = injector.inject(prompt, "पहले क्या बात हुई?").await;
    assert!(merged.contains("You: my name is Asha"));
    assert!(merged.contains("Jarvis: nice to meet you, Asha"));
}

/// Files written by the previous generation of the assistant (the
/// `entries`/`timestamp`/`jarvis` schema with naive timestamps) still load.
#[tokio::test]
async fn test_legacy_document_loads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("memory.json");
    tokio::fs::write(
        &path,
        r#"{
            "facts": {"meeting": "3pm"},
            "entries": [
                {"speaker": "user", "text": "hello", "timestamp": "2024-01-01T10:00:00"},
                {"speaker": "jarvis", "text": "hi", "timestamp": "2024-01-01T10:00:05"}
            ]
        }"#,
    )
    .await
    .unwrap();

    let store = Arc::new(DurableStore::new(path));
    let doc = store.load().await;
    assert_eq!(doc.conversation.len(), 2);
    assert_eq!(doc.conversation[1].speaker, Speaker::Assistant);
    assert_eq!(doc.facts.get("meeting").map(String::as_str), Some("3pm"));

    let summary = MemoryToolkit::new(store).get_recent_conversations(10).await;
    assert!(summary.contains("- You: hello"));
    assert!(summary.contains("- Jarvis: hi"));
}

/// Clearing truncates the conversation log and keeps the facts.
#[tokio::test]
async fn test_clear_keeps_facts() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);
    let log = ConversationLog::new(store.clone());
    let facts = FactLedger::new(store.clone());

    log.append(Speaker::User, "hello").await.unwrap();
    facts.remember("capital", "Delhi").await.unwrap();

    log.clear().await.unwrap();

    let doc = store.load().await;
    assert!(doc.conversation.is_empty());
    assert_eq!(doc.facts.len(), 1);
}

/// Memory survives the process: a second store over the same file sees
/// everything the first one wrote.
#[tokio::test]
async fn test_memory_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("memory.json");

    {
        let store = Arc::new(DurableStore::new(path.clone()));
        ConversationLog::new(store.clone())
            .append(Speaker::User, "hello")
            .await
            .unwrap();
        FactLedger::new(store)
            .remember("capital", "Delhi")
            .await
            .unwrap();
    }

    let reopened = Arc::new(DurableStore::new(path));
    let doc = reopened.load().await;
    assert_eq!(doc.conversation.len(), 1);
    assert_eq!(doc.facts.get("capital").map(String::as_str), Some("Delhi"));
}
