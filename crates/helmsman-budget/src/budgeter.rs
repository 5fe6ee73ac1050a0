// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adaptive token budgeting.
//!
//! `calculate` is a pure function: given the same query, difficulty,
//! VRAM headroom, and conversation length it always produces the same
//! generation ceiling. No side effects, no clock, no randomness.

use helmsman_config::model::TokenBudgetConfig;

use crate::classifier::{classify, QueryType};

/// Difficulty-to-base-token curve: five linear segments rising from
/// 128 tokens at difficulty 1 to 4096 at difficulty 100.
const SEGMENTS: [(u8, f64); 6] = [
    (1, 128.0),
    (20, 512.0),
    (40, 1024.0),
    (60, 2048.0),
    (80, 3072.0),
    (100, 4096.0),
];

/// Maps (query, difficulty, VRAM, conversation length) to a generation
/// token ceiling.
#[derive(Debug, Clone)]
pub struct TokenBudgeter {
    config: TokenBudgetConfig,
}

impl TokenBudgeter {
    pub fn new(config: TokenBudgetConfig) -> Self {
        Self { config }
    }

    /// Compute the generation token ceiling.
    ///
    /// Steps: classify the query when no type is supplied, interpolate a
    /// base count from the difficulty curve, scale by the type factor,
    /// clamp against the VRAM-derived ceiling, decay for long
    /// conversations (up to 30%), and clamp to the global bounds.
    ///
    /// Output is non-decreasing in `difficulty` with the other inputs
    /// held fixed.
    pub fn calculate(
        &self,
        query: &str,
        difficulty: u8,
        query_type: Option<QueryType>,
        available_vram_gb: f64,
        conversation_turns: usize,
    ) -> u32 {
        let query_type = query_type.unwrap_or_else(|| classify(query));
        let difficulty = difficulty.clamp(1, 100);

        let mut budget = base_tokens(difficulty) * query_type.factor();

        budget = budget.min(vram_ceiling(available_vram_gb));

        // -10% per 5 prior turns, floored at 0.7x.
        let decay_steps = (conversation_turns / 5) as f64;
        let decay = (1.0 - 0.1 * decay_steps).max(0.7);
        budget *= decay;

        (budget.round() as u32).clamp(self.config.min_tokens, self.config.max_tokens)
    }
}

impl Default for TokenBudgeter {
    fn default() -> Self {
        Self::new(TokenBudgetConfig::default())
    }
}

/// Piecewise-linear interpolation over the difficulty segments.
fn base_tokens(difficulty: u8) -> f64 {
    for window in SEGMENTS.windows(2) {
        let (lo_d, lo_t) = window[0];
        let (hi_d, hi_t) = window[1];
        if difficulty <= hi_d {
            let span = f64::from(hi_d - lo_d);
            let progress = f64::from(difficulty.saturating_sub(lo_d)) / span;
            return lo_t + (hi_t - lo_t) * progress;
        }
    }
    SEGMENTS[SEGMENTS.len() - 1].1
}

/// Ceiling imposed by available accelerator memory.
fn vram_ceiling(available_vram_gb: f64) -> f64 {
    if available_vram_gb < 4.0 {
        512.0
    } else if available_vram_gb < 8.0 {
        1024.0
    } else if available_vram_gb < 12.0 {
        2048.0
    } else {
        8192.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn budgeter() -> TokenBudgeter {
        TokenBudgeter::default()
    }

    #[test]
    fn base_curve_endpoints() {
        assert!((base_tokens(1) - 128.0).abs() < f64::EPSILON);
        assert!((base_tokens(20) - 512.0).abs() < f64::EPSILON);
        assert!((base_tokens(40) - 1024.0).abs() < f64::EPSILON);
        assert!((base_tokens(60) - 2048.0).abs() < f64::EPSILON);
        assert!((base_tokens(80) - 3072.0).abs() < f64::EPSILON);
        assert!((base_tokens(100) - 4096.0).abs() < f64::EPSILON);
    }

    #[test]
    fn base_curve_interpolates_within_segments() {
        // Midpoint of the first segment: (128 + 512) / 2 = 320.
        let mid = base_tokens(10);
        assert!(mid > 128.0 && mid < 512.0);
        assert!((mid - 310.9).abs() < 1.0, "got {mid}");
    }

    #[test]
    fn minimal_queries_get_half_budget() {
        let b = budgeter();
        let chat = b.calculate("query", 50, Some(QueryType::Chat), 24.0, 0);
        let minimal = b.calculate("query", 50, Some(QueryType::Minimal), 24.0, 0);
        assert!(minimal < chat);
    }

    #[test]
    fn multipart_queries_get_largest_budget() {
        let b = budgeter();
        let chat = b.calculate("query", 50, Some(QueryType::Chat), 24.0, 0);
        let multipart = b.calculate("query", 50, Some(QueryType::Multipart), 24.0, 0);
        assert!(f64::from(multipart) > 2.0 * f64::from(chat));
    }

    #[test]
    fn vram_ceiling_tiers() {
        let b = budgeter();
        // Same heavy query, shrinking VRAM headroom.
        let q = ("query", 100, Some(QueryType::Multipart));
        assert_eq!(b.calculate(q.0, q.1, q.2, 2.0, 0), 512);
        assert_eq!(b.calculate(q.0, q.1, q.2, 6.0, 0), 1024);
        assert_eq!(b.calculate(q.0, q.1, q.2, 10.0, 0), 2048);
        assert!(b.calculate(q.0, q.1, q.2, 24.0, 0) > 2048);
    }

    #[test]
    fn conversation_decay_caps_at_30_percent() {
        let b = budgeter();
        let fresh = b.calculate("query", 60, Some(QueryType::Chat), 24.0, 0);
        let ten_turns = b.calculate("query", 60, Some(QueryType::Chat), 24.0, 10);
        let long = b.calculate("query", 60, Some(QueryType::Chat), 24.0, 100);

        assert!(ten_turns < fresh);
        // Floor: never below 70% of the fresh budget (within rounding).
        assert!(f64::from(long) >= 0.7 * f64::from(fresh) - 1.0);
        // More turns past the floor change nothing.
        assert_eq!(long, b.calculate("query", 60, Some(QueryType::Chat), 24.0, 500));
    }

    #[test]
    fn global_bounds_hold() {
        let b = budgeter();
        // Tiny difficulty, minimal type, starved VRAM, long conversation.
        let floor = b.calculate("hi", 1, Some(QueryType::Minimal), 1.0, 100);
        assert!(floor >= 64);
        // Maxed-out everything.
        let cap = b.calculate("query", 100, Some(QueryType::Multipart), 64.0, 0);
        assert!(cap <= 8192);
    }

    #[test]
    fn unclassified_queries_are_classified() {
        let b = budgeter();
        // "hi" classifies as Minimal; an analysis prompt classifies larger.
        let minimal = b.calculate("hi", 50, None, 24.0, 0);
        let analysis = b.calculate("compare these two database designs in depth", 50, None, 24.0, 0);
        assert!(minimal < analysis);
    }

    proptest! {
        /// Monotonicity: budget is non-decreasing in difficulty with all
        /// other inputs held fixed.
        #[test]
        fn monotone_in_difficulty(
            d1 in 1u8..=100,
            d2 in 1u8..=100,
            vram in 0.5f64..64.0,
            turns in 0usize..50,
        ) {
            let b = budgeter();
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let lo_budget = b.calculate("query", lo, Some(QueryType::Chat), vram, turns);
            let hi_budget = b.calculate("query", hi, Some(QueryType::Chat), vram, turns);
            prop_assert!(lo_budget <= hi_budget);
        }

        /// Determinism: identical inputs always produce identical output.
        #[test]
        fn deterministic(
            difficulty in 1u8..=100,
            vram in 0.5f64..64.0,
            turns in 0usize..50,
        ) {
            let b = budgeter();
            let first = b.calculate("query", difficulty, None, vram, turns);
            let second = b.calculate("query", difficulty, None, vram, turns);
            prop_assert_eq!(first, second);
        }

        /// Output always lands inside the global bounds.
        #[test]
        fn bounded(
            difficulty in 1u8..=100,
            vram in 0.0f64..128.0,
            turns in 0usize..200,
        ) {
            let b = budgeter();
            let budget = b.calculate("query", difficulty, None, vram, turns);
            prop_assert!((64..=8192).contains(&budget));
        }
    }
}
