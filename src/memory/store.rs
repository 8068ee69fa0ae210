//! Durable JSON store with a single process-wide write gate
//!
//! Every mutation is load-mutate-save over the whole document. Two such
//! sequences interleaving would silently drop the first writer's effect, so
//! all mutations run under one `tokio::sync::Mutex` held for the full span.
//! Reads skip the gate; the save path writes a sibling temp file and renames
//! it into place so a concurrent load never observes a partial write.

use crate::memory::document::MemoryDocument;
use crate::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Exclusive owner of the on-disk memory file. All other components reach
/// the file through this store, never directly.
#[derive(Debug)]
pub struct DurableStore {
    file_path: PathBuf,
    write_gate: Mutex<()>,
}

impl DurableStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            write_gate: Mutex::new(()),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Read the current document. Never fails: a missing file, an unreadable
    /// file, or malformed content all yield a fresh empty document. Loading
    /// alone creates nothing on disk.
    pub async fn load(&self) -> MemoryDocument {
        let content = match fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return MemoryDocument::default();
            }
            Err(e) => {
                warn!("Failed to read memory file {:?}: {}", self.file_path, e);
                return MemoryDocument::default();
            }
        };

        match MemoryDocument::parse(&content) {
            Some(doc) => doc,
            None => {
                warn!(
                    "Memory file {:?} is not valid JSON; starting empty",
                    self.file_path
                );
                MemoryDocument::default()
            }
        }
    }

    /// Serialize the whole document and atomically replace the backing file.
    /// Filesystem errors propagate to the caller; there is no internal retry.
    pub async fn save(&self, doc: &MemoryDocument) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(doc)?;
        let tmp_path = self.file_path.with_extension("json.tmp");

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        drop(file);

        fs::rename(&tmp_path, &self.file_path).await?;
        debug!("Saved memory document to {:?}", self.file_path);
        Ok(())
    }

    /// Run one load-mutate-save sequence under the write gate, totally
    /// ordering it against every other mutation in the process. The
    /// closure's return value is handed back after the save succeeds.
    pub async fn mutate<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut MemoryDocument) -> R,
    {
        let _guard = self.write_gate.lock().await;
        let mut doc = self.load().await;
        let result = f(&mut doc);
        self.save(&doc).await?;
        Ok(result)
    }

    /// Replace the whole document without reading the previous one. Still
    /// serialized through the write gate. The bulk-overwrite escape hatch
    /// behind `save_raw`; bypasses the append/upsert contracts.
    pub async fn replace(&self, doc: &MemoryDocument) -> Result<()> {
        let _guard = self.write_gate.lock().await;
        self.save(doc).await
    }
}
