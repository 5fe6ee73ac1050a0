// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait used by the hybrid memory index.

use async_trait::async_trait;

use crate::error::HelmsmanError;

/// Adapter for text embedding backends.
///
/// The same adapter instance must be used to index memories and to embed
/// queries so that cosine similarity is meaningful.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    /// Embed a batch of texts. Output order matches input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HelmsmanError>;
}
