// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding fixtures for degraded-path tests.

use async_trait::async_trait;

use helmsman_core::{EmbeddingAdapter, HelmsmanError};

/// An embedder that always fails, for testing retrieval degradation.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingAdapter for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, HelmsmanError> {
        Err(HelmsmanError::Retrieval("scripted embedder failure".into()))
    }
}
