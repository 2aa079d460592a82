//! Memory traits: the contracts behind long-term and semantic memory.
//!
//! Memory tiers store text in a [`VectorStore`], which owns an [`Embedder`]
//! and answers similarity queries by text. Concrete stores and embedders
//! live in `agentsuite-memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::MemoryError;

/// What a memory item records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoryKind {
    /// Free text: user queries, action results, answers
    Text,
    /// An action invocation
    Action,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Action => "ACTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(Self::Text),
            "ACTION" => Some(Self::Action),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single remembered event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub kind: MemoryKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MemoryItem {
    pub fn new(kind: MemoryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(MemoryKind::Text, content)
    }

    pub fn action(content: impl Into<String>) -> Self {
        Self::new(MemoryKind::Action, content)
    }
}

/// Free-form metadata stored next to an indexed text.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One similarity search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Store-assigned id
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Cosine similarity in `[-1, 1]`
    pub score: f32,
}

/// Turns text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError>;
}

/// A text-addressed vector index.
///
/// Implementations embed on `add` and on `search`, and return hits by
/// descending similarity with ties broken most-recent-insertion-first.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store name (unique per agent for semantic stores).
    fn name(&self) -> &str;

    /// Index `texts`; `metadata` is matched by position and may be shorter.
    async fn add(&self, texts: Vec<String>, metadata: Vec<Metadata>) -> Result<Vec<String>, MemoryError>;

    /// Top-`k` hits for `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError>;

    /// Remove entries by id; returns how many were removed.
    async fn delete(&self, ids: &[String]) -> Result<usize, MemoryError>;

    async fn clear(&self) -> Result<(), MemoryError>;

    async fn count(&self) -> Result<usize, MemoryError>;

    /// On-disk location, for stores that persist themselves.
    fn location(&self) -> Option<&Path> {
        None
    }
}
