// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Difficulty estimator trait.

use async_trait::async_trait;

use crate::error::HelmsmanError;

/// Estimates query difficulty on the 1..=100 scale.
///
/// Supplied by an external component (possibly itself a lightweight
/// model call). The orchestrator maps estimator failures to the default
/// difficulty of 50 rather than failing the query.
#[async_trait]
pub trait DifficultyEstimator: Send + Sync {
    /// Estimate the difficulty of `query` in 1..=100.
    async fn estimate(&self, query: &str) -> Result<u8, HelmsmanError>;
}
