// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the conversational-memory corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One past interaction stored in the memory corpus.
///
/// Records are append-only: written once after a successful interaction,
/// never mutated, never deleted except by explicit bulk clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier for this record.
    pub id: String,
    /// Concatenated query + response text.
    pub text: String,
    /// Embedding vector produced by the corpus embedder.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Interaction bookkeeping.
    pub metadata: MemoryMetadata,
}

/// Bookkeeping attached to each memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetadata {
    /// When the interaction happened.
    pub timestamp: DateTime<Utc>,
    /// Difficulty the query was routed with.
    pub difficulty: u8,
    /// Model that produced the response.
    pub model: String,
    /// External quality estimate for the interaction (0.0-1.0).
    pub quality_score: f64,
}

/// Which retriever(s) surfaced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    Dense,
    Sparse,
    Hybrid,
}

/// One fused retrieval hit. Ephemeral, produced per query, not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    /// Id of the underlying memory record.
    pub document_id: String,
    /// Record text for prompt augmentation.
    pub text: String,
    /// Reciprocal-rank-fusion score.
    pub fused_score: f64,
    /// Which ranking(s) the document appeared in.
    pub source: RetrievalSource,
    /// 1-based rank in the fused list.
    pub rank: usize,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for zero-magnitude inputs rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
