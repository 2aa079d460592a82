//! Vector similarity and ranking utilities.

use agentsuite_core::memory::{Metadata, SearchHit};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// One indexed text with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVector {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
    /// Insertion sequence number; higher is newer.
    pub seq: u64,
}

/// Rank entries by cosine similarity to a query embedding.
///
/// Sorted by descending similarity; equal scores put the newest insertion
/// first.
pub fn rank_by_similarity(entries: &[StoredVector], query_embedding: &[f32], limit: usize) -> Vec<SearchHit> {
    let mut scored: Vec<(f32, &StoredVector)> = entries
        .iter()
        .map(|entry| (cosine_similarity(&entry.embedding, query_embedding), entry))
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.1.seq.cmp(&a.1.seq))
    });
    scored.truncate(limit);
    scored
        .into_iter()
        .map(|(score, entry)| SearchHit {
            id: entry.id.clone(),
            text: entry.text.clone(),
            metadata: entry.metadata.clone(),
            score,
        })
        .collect()
}
