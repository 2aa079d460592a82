//! File-backed vector store: persistent JSON-lines storage.
//!
//! Each line is one JSON-encoded [`StoredVector`], embedding included, so a
//! store reopened from disk answers queries without re-embedding anything.

use crate::in_memory::InMemoryVectorStore;
use crate::vector::StoredVector;
use agentsuite_core::error::MemoryError;
use agentsuite_core::memory::{Embedder, Metadata, SearchHit, VectorStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A vector store persisted as JSONL.
///
/// Entries are loaded on open and the whole file is rewritten after every
/// mutation (add, delete, clear).
pub struct FileVectorStore {
    path: PathBuf,
    inner: InMemoryVectorStore,
}

impl FileVectorStore {
    /// Open the store at `path`. A missing file starts empty and is created
    /// on first write.
    pub async fn open(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, MemoryError> {
        let path = path.into();
        let entries = load_from_disk(&path).await?;
        debug!(path = %path.display(), count = entries.len(), "File vector store loaded");
        Ok(Self {
            inner: InMemoryVectorStore::from_entries(name, embedder, entries),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoryError::Storage(format!("Failed to create store directory: {e}")))?;
        }

        let mut content = String::new();
        for entry in self.inner.snapshot().await {
            let line = serde_json::to_string(&entry)
                .map_err(|e| MemoryError::Storage(format!("Failed to serialize vector entry: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write store file: {e}")))
    }
}

async fn load_from_disk(path: &Path) -> Result<Vec<StoredVector>, MemoryError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(MemoryError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            )));
        }
    };

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<StoredVector>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping corrupted vector entry");
                None
            }
        })
        .collect())
}

#[async_trait]
impl VectorStore for FileVectorStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn add(&self, texts: Vec<String>, metadata: Vec<Metadata>) -> Result<Vec<String>, MemoryError> {
        let ids = self.inner.add(texts, metadata).await?;
        if !ids.is_empty() {
            self.flush().await?;
        }
        Ok(ids)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError> {
        self.inner.search(query, k).await
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, MemoryError> {
        let removed = self.inner.delete(ids).await?;
        if removed > 0 {
            self.flush().await?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.inner.clear().await?;
        self.flush().await
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        self.inner.count().await
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::default())
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ltm").join("vectors.jsonl");

        {
            let store = FileVectorStore::open("ltm", &path, embedder()).await.unwrap();
            store
                .add(vec!["Rust is fast".into(), "The sky is blue".into()], vec![])
                .await
                .unwrap();
        }

        let reopened = FileVectorStore::open("ltm", &path, embedder()).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        let hits = reopened.search("rust fast", 1).await.unwrap();
        assert_eq!(hits[0].text, "Rust is fast");
        assert_eq!(reopened.location(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open("x", dir.path().join("none.jsonl"), embedder())
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.jsonl");
        {
            let store = FileVectorStore::open("x", &path, embedder()).await.unwrap();
            store.add(vec!["valid".into()], vec![]).await.unwrap();
        }
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not json\n");
        std::fs::write(&path, content).unwrap();

        let store = FileVectorStore::open("x", &path, embedder()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.jsonl");
        let store = FileVectorStore::open("x", &path, embedder()).await.unwrap();
        let ids = store.add(vec!["a".into(), "b".into()], vec![]).await.unwrap();
        store.delete(&ids[..1]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);

        store.clear().await.unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }
}
