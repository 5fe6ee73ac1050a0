// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Helmsman orchestration core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use helmsman_core::ModelDescriptor;
use serde::{Deserialize, Serialize};

/// Top-level Helmsman configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values; the
/// model catalog is the only part a deployment must supply.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HelmsmanConfig {
    /// Process-level runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Orchestrator selection and dispatch settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// VRAM ledger admission and eviction settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Circuit breaker and error budget settings.
    #[serde(default)]
    pub resilience: ResilienceConfig,

    /// Token budgeter bounds.
    #[serde(default)]
    pub budget: TokenBudgetConfig,

    /// Hybrid memory retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Remote API driver settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Model catalog, one `[[model]]` block per descriptor.
    #[serde(default, rename = "model")]
    pub models: Vec<ModelDescriptor>,
}

/// Process-level runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Orchestrator selection and dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Priority-score bonus subtracted when a descriptor carries the
    /// requested specialty tag.
    #[serde(default = "default_specialty_bonus")]
    pub specialty_bonus: u32,

    /// Per-attempt generation deadline in seconds. A timed-out call
    /// counts as a breaker failure for that backend.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// User-visible text returned when every backend, including the
    /// remote fallback tier, has failed.
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            specialty_bonus: default_specialty_bonus(),
            request_timeout_seconds: default_request_timeout(),
            failure_message: default_failure_message(),
        }
    }
}

fn default_specialty_bonus() -> u32 {
    2
}

fn default_request_timeout() -> u64 {
    120
}

fn default_failure_message() -> String {
    "All model backends are currently unavailable. Please try again in a moment.".to_string()
}

/// VRAM ledger configuration.
///
/// The admission formula is
/// `required = (vram + max(margin_fraction * vram, fixed_buffer_mb)) * peak_multiplier`.
/// The constants are empirical; they are configuration, not logic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Size-proportional safety margin on top of the model footprint.
    #[serde(default = "default_margin_fraction")]
    pub safety_margin_fraction: f64,

    /// Fixed minimum buffer in MB, whichever of the two margins is larger.
    #[serde(default = "default_fixed_buffer")]
    pub fixed_buffer_mb: u64,

    /// Inflation factor covering inference-time peak usage.
    #[serde(default = "default_peak_multiplier")]
    pub peak_multiplier: f64,

    /// Maximum models resident per accelerator before LRU eviction.
    #[serde(default = "default_max_models")]
    pub max_models_per_accelerator: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            safety_margin_fraction: default_margin_fraction(),
            fixed_buffer_mb: default_fixed_buffer(),
            peak_multiplier: default_peak_multiplier(),
            max_models_per_accelerator: default_max_models(),
        }
    }
}

fn default_margin_fraction() -> f64 {
    0.15
}

fn default_fixed_buffer() -> u64 {
    512
}

fn default_peak_multiplier() -> f64 {
    1.2
}

fn default_max_models() -> usize {
    2
}

/// Combined resilience configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResilienceConfig {
    /// Circuit breaker thresholds.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Error budget window and cooldown.
    #[serde(default)]
    pub error_budget: ErrorBudgetConfig,
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures in CLOSED before the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Consecutive probe successes in HALF_OPEN before closing.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Seconds an open circuit waits before allowing a probe.
    #[serde(default = "default_breaker_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            timeout_seconds: default_breaker_timeout(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    2
}

fn default_breaker_timeout() -> u64 {
    30
}

/// Error budget window and cooldown.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorBudgetConfig {
    /// Sliding window length in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Errors within the window before cooldown triggers.
    #[serde(default = "default_max_errors")]
    pub max_errors: usize,

    /// Cooldown length in seconds once the budget is exhausted.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
}

impl Default for ErrorBudgetConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            max_errors: default_max_errors(),
            cooldown_seconds: default_cooldown_seconds(),
        }
    }
}

fn default_window_seconds() -> u64 {
    60
}

fn default_max_errors() -> usize {
    5
}

fn default_cooldown_seconds() -> u64 {
    120
}

/// Token budgeter global bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenBudgetConfig {
    /// Hard floor for any generation ceiling.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: u32,

    /// Hard cap for any generation ceiling.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TokenBudgetConfig {
    fn default() -> Self {
        Self {
            min_tokens: default_min_tokens(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_min_tokens() -> u32 {
    64
}

fn default_max_tokens() -> u32 {
    8192
}

/// Hybrid retrieval configuration.
///
/// `alpha` and `k_rrf` default to the standard literature values; both
/// are deployment-tunable rather than hard-coded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Candidates taken from the dense (embedding) ranking.
    #[serde(default = "default_top_k_dense")]
    pub top_k_dense: usize,

    /// Candidates taken from the sparse (BM25) ranking.
    #[serde(default = "default_top_k_sparse")]
    pub top_k_sparse: usize,

    /// Fused results returned to the caller.
    #[serde(default = "default_top_k_final")]
    pub top_k_final: usize,

    /// RRF rank-smoothing constant.
    #[serde(default = "default_k_rrf")]
    pub k_rrf: f64,

    /// Dense-vs-sparse fusion weight in [0, 1]; 0.5 is equal weighting.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k_dense: default_top_k_dense(),
            top_k_sparse: default_top_k_sparse(),
            top_k_final: default_top_k_final(),
            k_rrf: default_k_rrf(),
            alpha: default_alpha(),
        }
    }
}

fn default_top_k_dense() -> usize {
    10
}

fn default_top_k_sparse() -> usize {
    10
}

fn default_top_k_final() -> usize {
    5
}

fn default_k_rrf() -> f64 {
    60.0
}

fn default_alpha() -> f64 {
    0.5
}

/// Remote API driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Bearer token for remote endpoints. `None` requires environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_remote_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            request_timeout_seconds: default_remote_timeout(),
        }
    }
}

fn default_remote_timeout() -> u64 {
    300
}
