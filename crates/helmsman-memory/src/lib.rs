// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational memory retrieval for the Helmsman orchestration core.
//!
//! Provides hybrid search over an append-only in-memory corpus:
//!
//! - **Dense**: embedding cosine similarity through an [`EmbeddingAdapter`]
//! - **Sparse**: in-process Okapi BM25, rebuilt lazily after mutations
//! - **Fusion**: weighted Reciprocal Rank Fusion (`k_rrf = 60`,
//!   `alpha = 0.5` by default)
//!
//! Retrieval is best-effort: failures degrade to an empty context, never
//! to a failed generation.
//!
//! [`EmbeddingAdapter`]: helmsman_core::EmbeddingAdapter

pub mod bm25;
pub mod embedder;
pub mod index;
pub mod types;

pub use bm25::Bm25Index;
pub use embedder::HashEmbedder;
pub use index::HybridMemoryIndex;
pub use types::{
    cosine_similarity, MemoryMetadata, MemoryRecord, RetrievalResult, RetrievalSource,
};
