// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Difficulty estimator fixtures.

use async_trait::async_trait;

use helmsman_core::{DifficultyEstimator, HelmsmanError};

/// An estimator returning a fixed difficulty.
pub struct FixedEstimator(pub u8);

#[async_trait]
impl DifficultyEstimator for FixedEstimator {
    async fn estimate(&self, _query: &str) -> Result<u8, HelmsmanError> {
        Ok(self.0)
    }
}

/// An estimator that always fails; the orchestrator must assume
/// difficulty 50.
pub struct FailingEstimator;

#[async_trait]
impl DifficultyEstimator for FailingEstimator {
    async fn estimate(&self, _query: &str) -> Result<u8, HelmsmanError> {
        Err(HelmsmanError::Internal("scripted estimator failure".into()))
    }
}
