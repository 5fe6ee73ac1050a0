// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid memory index combining dense and sparse retrieval via RRF.
//!
//! The index embeds the query, ranks the corpus by cosine similarity and
//! by BM25, and fuses the two rankings with weighted Reciprocal Rank
//! Fusion. Retrieval is best-effort context enrichment: embedding or
//! index errors are logged and degrade to an empty result list, never a
//! hard failure for generation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use helmsman_config::model::RetrievalConfig;
use helmsman_core::{EmbeddingAdapter, HelmsmanError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::bm25::Bm25Index;
use crate::types::{cosine_similarity, MemoryMetadata, MemoryRecord, RetrievalResult, RetrievalSource};

struct CorpusState {
    records: Vec<MemoryRecord>,
    sparse: Option<Bm25Index>,
    /// Set on every mutation; the sparse index is rebuilt lazily on the
    /// first query afterwards.
    sparse_dirty: bool,
}

/// Hybrid dense + sparse retriever over the conversation-memory corpus.
pub struct HybridMemoryIndex {
    embedder: Arc<dyn EmbeddingAdapter>,
    config: RetrievalConfig,
    corpus: RwLock<CorpusState>,
}

impl HybridMemoryIndex {
    /// Create an empty index backed by the given embedder.
    ///
    /// The same embedder must serve both indexing and queries.
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>, config: RetrievalConfig) -> Self {
        Self {
            embedder,
            config,
            corpus: RwLock::new(CorpusState {
                records: Vec::new(),
                sparse: None,
                sparse_dirty: false,
            }),
        }
    }

    /// Append one interaction to the corpus. Returns the new record id.
    ///
    /// This is the append-only write path the external collaborator calls
    /// after each successful interaction.
    pub async fn insert(
        &self,
        text: &str,
        difficulty: u8,
        model: &str,
        quality_score: f64,
    ) -> Result<String, HelmsmanError> {
        let embeddings = self.embedder.embed(&[text.to_string()]).await?;
        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| HelmsmanError::Retrieval("embedder returned no vectors".into()))?;

        let record = MemoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            embedding,
            metadata: MemoryMetadata {
                timestamp: Utc::now(),
                difficulty,
                model: model.to_string(),
                quality_score,
            },
        };
        let id = record.id.clone();

        let mut corpus = self.corpus.write().await;
        corpus.records.push(record);
        corpus.sparse_dirty = true;
        debug!(records = corpus.records.len(), "memory record appended");

        Ok(id)
    }

    /// Number of records in the corpus.
    pub async fn len(&self) -> usize {
        self.corpus.read().await.records.len()
    }

    /// True if the corpus holds no records.
    pub async fn is_empty(&self) -> bool {
        self.corpus.read().await.records.is_empty()
    }

    /// Explicit bulk clear, the only supported deletion.
    pub async fn clear(&self) {
        let mut corpus = self.corpus.write().await;
        corpus.records.clear();
        corpus.sparse = None;
        corpus.sparse_dirty = false;
    }

    /// Retrieve the top-K fused results for `query`.
    ///
    /// Never fails: any embedding or index error is logged and an empty
    /// list is returned instead.
    pub async fn search(&self, query: &str) -> Vec<RetrievalResult> {
        match self.search_inner(query).await {
            Ok(results) => results,
            Err(err) => {
                warn!(error = %err, "memory retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    async fn search_inner(&self, query: &str) -> Result<Vec<RetrievalResult>, HelmsmanError> {
        if self.corpus.read().await.records.is_empty() {
            return Ok(Vec::new());
        }

        self.rebuild_sparse_if_dirty().await;

        let query_embedding = {
            let embeddings = self.embedder.embed(&[query.to_string()]).await?;
            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| HelmsmanError::Retrieval("embedder returned no vectors".into()))?
        };

        let corpus = self.corpus.read().await;

        // Dense ranking: cosine similarity, descending; stable sort keeps
        // insertion order on ties.
        let mut dense: Vec<(usize, f32)> = corpus
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.embedding.len() == query_embedding.len())
            .map(|(idx, r)| (idx, cosine_similarity(&query_embedding, &r.embedding)))
            .collect();
        dense.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        dense.truncate(self.config.top_k_dense);

        // Sparse ranking via BM25.
        let sparse: Vec<(usize, f64)> = corpus
            .sparse
            .as_ref()
            .map(|index| index.search(query, self.config.top_k_sparse))
            .unwrap_or_default();

        // An empty sparse side degrades fusion to dense-only ranking.
        let alpha = if sparse.is_empty() { 1.0 } else { self.config.alpha };

        let fused = self.fuse(&dense, &sparse, alpha);

        let results = fused
            .into_iter()
            .take(self.config.top_k_final)
            .enumerate()
            .map(|(i, (idx, score, source))| {
                let record = &corpus.records[idx];
                RetrievalResult {
                    document_id: record.id.clone(),
                    text: record.text.clone(),
                    fused_score: score,
                    source,
                    rank: i + 1,
                }
            })
            .collect();

        Ok(results)
    }

    /// Weighted Reciprocal Rank Fusion.
    ///
    /// `rrf(doc) = alpha / (k + rank_dense) + (1 - alpha) / (k + rank_sparse)`,
    /// with a missing rank contributing 0 for its term. Ranks are 1-based.
    /// Ties resolve by corpus insertion order.
    fn fuse(
        &self,
        dense: &[(usize, f32)],
        sparse: &[(usize, f64)],
        alpha: f64,
    ) -> Vec<(usize, f64, RetrievalSource)> {
        let k = self.config.k_rrf;
        let mut scores: HashMap<usize, (f64, bool, bool)> = HashMap::new();

        for (rank, (idx, _)) in dense.iter().enumerate() {
            let entry = scores.entry(*idx).or_insert((0.0, false, false));
            entry.0 += alpha / (k + (rank + 1) as f64);
            entry.1 = true;
        }

        for (rank, (idx, _)) in sparse.iter().enumerate() {
            let entry = scores.entry(*idx).or_insert((0.0, false, false));
            entry.0 += (1.0 - alpha) / (k + (rank + 1) as f64);
            entry.2 = true;
        }

        let mut fused: Vec<(usize, f64, RetrievalSource)> = scores
            .into_iter()
            .map(|(idx, (score, in_dense, in_sparse))| {
                let source = match (in_dense, in_sparse) {
                    (true, true) => RetrievalSource::Hybrid,
                    (true, false) => RetrievalSource::Dense,
                    _ => RetrievalSource::Sparse,
                };
                (idx, score, source)
            })
            .collect();

        fused.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        fused
    }

    async fn rebuild_sparse_if_dirty(&self) {
        let needs_rebuild = {
            let corpus = self.corpus.read().await;
            corpus.sparse_dirty || corpus.sparse.is_none()
        };
        if !needs_rebuild {
            return;
        }

        let mut corpus = self.corpus.write().await;
        // Re-check under the write lock; a concurrent query may have
        // rebuilt already.
        if corpus.sparse_dirty || corpus.sparse.is_none() {
            let index = {
                let texts: Vec<&str> =
                    corpus.records.iter().map(|r| r.text.as_str()).collect();
                Bm25Index::build(&texts)
            };
            debug!(documents = index.len(), "sparse index rebuilt");
            corpus.sparse = Some(index);
            corpus.sparse_dirty = false;
        }
    }
}
