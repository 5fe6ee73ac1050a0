// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./helmsman.toml` > `~/.config/helmsman/helmsman.toml`
//! > `/etc/helmsman/helmsman.toml` with environment variable overrides via
//! `HELMSMAN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HelmsmanConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/helmsman/helmsman.toml` (system-wide)
/// 3. `~/.config/helmsman/helmsman.toml` (user XDG config)
/// 4. `./helmsman.toml` (local directory)
/// 5. `HELMSMAN_*` environment variables
pub fn load_config() -> Result<HelmsmanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelmsmanConfig::default()))
        .merge(Toml::file("/etc/helmsman/helmsman.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("helmsman/helmsman.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("helmsman.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<HelmsmanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelmsmanConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HelmsmanConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HelmsmanConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `HELMSMAN_LEDGER_FIXED_BUFFER_MB` must
/// map to `ledger.fixed_buffer_mb`, not `ledger.fixed.buffer.mb`.
fn env_provider() -> Env {
    Env::prefixed("HELMSMAN_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: HELMSMAN_LEDGER_FIXED_BUFFER_MB -> "ledger_fixed_buffer_mb"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("runtime_", "runtime.", 1)
            .replacen("orchestrator_", "orchestrator.", 1)
            .replacen("ledger_", "ledger.", 1)
            .replacen("resilience_breaker_", "resilience.breaker.", 1)
            .replacen("resilience_error_budget_", "resilience.error_budget.", 1)
            .replacen("budget_", "budget.", 1)
            .replacen("retrieval_", "retrieval.", 1)
            .replacen("remote_", "remote.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_files() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.runtime.log_level, "info");
        assert_eq!(config.resilience.breaker.failure_threshold, 5);
        assert!(config.models.is_empty());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [ledger]
            fixed_buffer_mb = 1024
            max_models_per_accelerator = 3

            [retrieval]
            alpha = 0.7
            "#,
        )
        .unwrap();
        assert_eq!(config.ledger.fixed_buffer_mb, 1024);
        assert_eq!(config.ledger.max_models_per_accelerator, 3);
        assert!((config.retrieval.alpha - 0.7).abs() < f64::EPSILON);
        // Untouched sections keep defaults.
        assert!((config.ledger.safety_margin_fraction - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn catalog_parses_model_blocks() {
        let config = load_config_from_str(
            r#"
            [[model]]
            id = "local-qwen-14b"
            backend = "local-vllm"
            path_or_endpoint = "/models/qwen-14b-awq"
            accelerator = 0
            vram_required_mb = 11000
            difficulty_range = [1, 60]
            quantization = "awq"
            max_context_tokens = 16384
            priority = 1
            specialties = ["code"]

            [[model]]
            id = "openai-gpt"
            backend = "remote-api"
            path_or_endpoint = "https://api.openai.com/v1"
            difficulty_range = [1, 100]
            max_context_tokens = 128000
            priority = 99
            "#,
        )
        .unwrap();

        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[0].id, "local-qwen-14b");
        assert!(config.models[0].is_local());
        assert_eq!(config.models[0].difficulty_range, (1, 60));
        assert!(!config.models[1].is_local());
        assert_eq!(config.models[1].accelerator, None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = load_config_from_str(
            r#"
            [ledger]
            fixed_bufer_mb = 1024
            "#,
        );
        assert!(result.is_err());
    }
}
