//! Semantic memory: named knowledge stores populated from text, files and URLs.

use crate::source::{Source, http_client};
use crate::splitter::TextSplitter;
use agentsuite_core::error::MemoryError;
use agentsuite_core::memory::{Metadata, SearchHit, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct SemanticMemory {
    name: String,
    store: Arc<dyn VectorStore>,
    splitter: TextSplitter,
    client: reqwest::Client,
}

impl SemanticMemory {
    pub fn new(name: impl Into<String>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            name: name.into(),
            store,
            splitter: TextSplitter::default(),
            client: http_client(),
        }
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn location(&self) -> Option<&Path> {
        self.store.location()
    }

    /// Classify, fetch, chunk and index a source. Returns the number of
    /// chunks indexed.
    pub async fn ingest(&self, source: &str) -> Result<usize, MemoryError> {
        let source = Source::classify(source);
        let text = source.load(&self.client).await?;
        self.index(&text, &source.reference()).await
    }

    /// Chunk and index plain text without classifying it.
    pub async fn ingest_text(&self, text: &str) -> Result<usize, MemoryError> {
        self.index(text, "text").await
    }

    async fn index(&self, text: &str, source_ref: &str) -> Result<usize, MemoryError> {
        let chunks = self.splitter.split(text);
        if chunks.is_empty() {
            return Ok(0);
        }
        let metadata = (0..chunks.len())
            .map(|i| {
                let mut m = Metadata::new();
                m.insert("source".into(), source_ref.into());
                m.insert("chunk".into(), i.into());
                m
            })
            .collect();
        let count = self.store.add(chunks, metadata).await?.len();
        info!(memory = %self.name, source = source_ref, chunks = count, "Ingested knowledge");
        Ok(count)
    }

    pub async fn recall(&self, phrase: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError> {
        self.store.search(phrase, k).await
    }

    pub async fn clear(&self) -> Result<(), MemoryError> {
        self.store.clear().await
    }
}
