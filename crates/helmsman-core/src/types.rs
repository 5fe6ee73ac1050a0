// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the orchestrator and its collaborator traits.

use serde::{Deserialize, Serialize};

/// Difficulty scores live on an inclusive 1..=100 scale.
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 100;

/// Difficulty assumed when the external estimator fails.
pub const DEFAULT_DIFFICULTY: u8 = 50;

/// Clamp a raw difficulty estimate onto the valid 1..=100 scale.
pub fn clamp_difficulty(raw: i64) -> u8 {
    raw.clamp(i64::from(MIN_DIFFICULTY), i64::from(MAX_DIFFICULTY)) as u8
}

/// A single generation request handed to a local or remote backend driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Fully assembled prompt, including any retrieved memory context.
    pub prompt: String,
    /// Generation token ceiling from the token budgeter.
    pub max_tokens: u32,
    /// Sampling temperature, taken from the selected descriptor.
    pub temperature: f32,
}

/// Bookkeeping returned alongside a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMeta {
    /// Descriptor id that produced the response.
    pub model_id: String,
    /// Wall-clock latency of the winning backend call, in milliseconds.
    pub latency_ms: u64,
    /// Token ceiling that was in effect for the call.
    pub max_tokens: u32,
    /// Difficulty the query was routed with.
    pub difficulty: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_difficulty_bounds() {
        assert_eq!(clamp_difficulty(-5), 1);
        assert_eq!(clamp_difficulty(0), 1);
        assert_eq!(clamp_difficulty(1), 1);
        assert_eq!(clamp_difficulty(50), 50);
        assert_eq!(clamp_difficulty(100), 100);
        assert_eq!(clamp_difficulty(250), 100);
    }

    #[test]
    fn generation_request_roundtrip() {
        let req = GenerationRequest {
            prompt: "hello".into(),
            max_tokens: 512,
            temperature: 0.7,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: GenerationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.prompt, "hello");
        assert_eq!(back.max_tokens, 512);
    }
}
