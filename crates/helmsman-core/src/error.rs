// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Helmsman orchestration core.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across Helmsman traits and core operations.
#[derive(Debug, Error)]
pub enum HelmsmanError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend generation errors (driver failure, API error, malformed output).
    #[error("backend `{name}` error: {message}")]
    Backend {
        name: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Call rejected because the backend's circuit breaker is open.
    #[error("circuit open for backend `{backend}`")]
    CircuitOpen { backend: String },

    /// Call rejected because the subsystem's error budget is in cooldown.
    #[error("subsystem `{subsystem}` in cooldown for {remaining:?}")]
    CooldownActive {
        subsystem: String,
        remaining: Duration,
    },

    /// VRAM admission failed: the accelerator cannot hold the model.
    #[error(
        "accelerator {accelerator} cannot admit load: {required_mb} MB required, {available_mb} MB available"
    )]
    ResourceExhausted {
        accelerator: u32,
        required_mb: u64,
        available_mb: u64,
    },

    /// A generation call referenced a model that is not currently loaded.
    #[error("model `{model}` is not loaded")]
    ModelNotLoaded { model: String },

    /// No catalogued descriptor (including the fallback tier) could serve the query.
    #[error("no candidate model for difficulty {difficulty}")]
    NoCandidateModel { difficulty: u8 },

    /// Memory retrieval errors. Recovered at the index boundary, never surfaced.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
