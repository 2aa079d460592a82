//! Long-term memory: durable, similarity-searchable memory items.

use agentsuite_core::error::MemoryError;
use agentsuite_core::memory::{MemoryItem, MemoryKind, Metadata, SearchHit, VectorStore};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Memory items indexed in a vector store, with their kind and creation
/// time kept as metadata.
pub struct LongTermMemory {
    name: String,
    store: Arc<dyn VectorStore>,
}

impl LongTermMemory {
    pub fn new(name: impl Into<String>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Where the backing store persists, if anywhere.
    pub fn location(&self) -> Option<&Path> {
        self.store.location()
    }

    /// Embed and index a copy of `item`. Returns the store id.
    pub async fn insert(&self, item: &MemoryItem) -> Result<String, MemoryError> {
        let mut metadata = Metadata::new();
        metadata.insert("kind".into(), item.kind.as_str().into());
        metadata.insert("created_at".into(), item.created_at.to_rfc3339().into());

        let id = self
            .store
            .add(vec![item.content.clone()], vec![metadata])
            .await?
            .pop()
            .ok_or_else(|| MemoryError::Storage("store returned no id".into()))?;
        debug!(memory = %self.name, kind = %item.kind, "Inserted into long-term memory");
        Ok(id)
    }

    /// Top `k` items by similarity to `phrase`.
    pub async fn recall(&self, phrase: &str, k: usize) -> Result<Vec<MemoryItem>, MemoryError> {
        let hits = self.store.search(phrase, k).await?;
        Ok(hits.into_iter().map(hit_to_item).collect())
    }

    /// Top `k` items of one kind. Over-fetches from the store until `k`
    /// matches are found or the store is exhausted.
    pub async fn recall_kind(&self, phrase: &str, k: usize, kind: MemoryKind) -> Result<Vec<MemoryItem>, MemoryError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let total = self.store.count().await?;
        let mut fetch = k.saturating_mul(2);
        loop {
            let hits = self.store.search(phrase, fetch).await?;
            let exhausted = hits.len() < fetch || fetch >= total;
            let matching: Vec<MemoryItem> = hits
                .into_iter()
                .map(hit_to_item)
                .filter(|item| item.kind == kind)
                .take(k)
                .collect();
            if matching.len() == k || exhausted {
                return Ok(matching);
            }
            fetch = fetch.saturating_mul(2);
        }
    }

    pub async fn clear(&self) -> Result<(), MemoryError> {
        self.store.clear().await
    }

    pub async fn count(&self) -> Result<usize, MemoryError> {
        self.store.count().await
    }
}

fn hit_to_item(hit: SearchHit) -> MemoryItem {
    let kind = hit
        .metadata
        .get("kind")
        .and_then(|v| v.as_str())
        .and_then(MemoryKind::parse)
        .unwrap_or(MemoryKind::Text);
    let created_at = hit
        .metadata
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    MemoryItem {
        kind,
        content: hit.text,
        created_at,
    }
}
