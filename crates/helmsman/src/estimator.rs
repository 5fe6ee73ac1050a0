// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in heuristic difficulty estimator.
//!
//! Deployments with a dedicated estimator model supply their own
//! [`DifficultyEstimator`]; this one maps the query-type heuristics onto
//! the difficulty scale so the binary works standalone.
//!
//! [`DifficultyEstimator`]: helmsman_core::DifficultyEstimator

use async_trait::async_trait;
use helmsman_budget::{classify, QueryType};
use helmsman_core::{DifficultyEstimator, HelmsmanError};

/// Difficulty estimation from query-type heuristics.
pub struct HeuristicEstimator;

#[async_trait]
impl DifficultyEstimator for HeuristicEstimator {
    async fn estimate(&self, query: &str) -> Result<u8, HelmsmanError> {
        Ok(match classify(query) {
            QueryType::Minimal => 5,
            QueryType::Chat => 25,
            QueryType::Explanation => 45,
            QueryType::Code => 65,
            QueryType::Reasoning => 75,
            QueryType::Analysis => 80,
            QueryType::Multipart => 90,
        })
    }
}
