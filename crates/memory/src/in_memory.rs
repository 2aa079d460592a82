//! In-memory vector store: useful for testing and ephemeral agents.

use crate::vector::{StoredVector, rank_by_similarity};
use agentsuite_core::error::MemoryError;
use agentsuite_core::memory::{Embedder, Metadata, SearchHit, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct StoreState {
    entries: Vec<StoredVector>,
    next_seq: u64,
}

/// A vector store that keeps every embedding in a Vec and scans it on search.
pub struct InMemoryVectorStore {
    name: String,
    embedder: Arc<dyn Embedder>,
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryVectorStore {
    pub fn new(name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self::from_entries(name, embedder, Vec::new())
    }

    /// Rebuild a store from previously snapshotted entries.
    pub fn from_entries(name: impl Into<String>, embedder: Arc<dyn Embedder>, entries: Vec<StoredVector>) -> Self {
        let next_seq = entries.iter().map(|e| e.seq + 1).max().unwrap_or(0);
        Self {
            name: name.into(),
            embedder,
            state: Arc::new(RwLock::new(StoreState { entries, next_seq })),
        }
    }

    /// Copy of every stored entry, in insertion order.
    pub async fn snapshot(&self) -> Vec<StoredVector> {
        self.state.read().await.entries.clone()
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, texts: Vec<String>, metadata: Vec<Metadata>) -> Result<Vec<String>, MemoryError> {
        if metadata.len() > texts.len() {
            return Err(MemoryError::Storage(format!(
                "{} metadata entries for {} texts",
                metadata.len(),
                texts.len()
            )));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(MemoryError::EmbeddingFailed(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        let mut metadata = metadata.into_iter();
        let mut state = self.state.write().await;
        let mut ids = Vec::with_capacity(texts.len());
        for (text, embedding) in texts.into_iter().zip(embeddings) {
            let id = Uuid::new_v4().to_string();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.entries.push(StoredVector {
                id: id.clone(),
                text,
                metadata: metadata.next().unwrap_or_default(),
                embedding,
                seq,
            });
            ids.push(id);
        }
        debug!(store = %self.name, added = ids.len(), total = state.entries.len(), "Indexed texts");
        Ok(ids)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| MemoryError::EmbeddingFailed("no embedding for query".into()))?;

        let state = self.state.read().await;
        Ok(rank_by_similarity(&state.entries, &query_embedding, k))
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, MemoryError> {
        let mut state = self.state.write().await;
        let len_before = state.entries.len();
        state.entries.retain(|e| !ids.contains(&e.id));
        Ok(len_before - state.entries.len())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.state.write().await.entries.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.state.read().await.entries.len())
    }
}
