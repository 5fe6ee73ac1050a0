// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic bag-of-words embedder.
//!
//! A zero-dependency fallback for deployments without a neural embedding
//! model: tokens hash into buckets and the counts are L2-normalized, so
//! identical texts embed identically and token overlap yields
//! proportional cosine similarity. Deployments with a real embedding
//! model wire their own [`EmbeddingAdapter`] instead.
//!
//! [`EmbeddingAdapter`]: helmsman_core::EmbeddingAdapter

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use helmsman_core::{EmbeddingAdapter, HelmsmanError};

/// Hashed bag-of-words embedder with a fixed dimensionality.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingAdapter for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HelmsmanError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
