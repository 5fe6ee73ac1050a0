// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: catalog id uniqueness, difficulty range sanity, accelerator
//! assignment for local models, fusion weight bounds.

use std::collections::HashSet;

use helmsman_core::types::{MAX_DIFFICULTY, MIN_DIFFICULTY};

use crate::diagnostic::ConfigError;
use crate::model::HelmsmanConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HelmsmanConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Catalog ids must be unique and non-empty.
    let mut seen_ids = HashSet::new();
    for (i, model) in config.models.iter().enumerate() {
        if model.id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("model[{i}].id must not be empty"),
            });
        } else if !seen_ids.insert(&model.id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate model id `{}` in catalog", model.id),
            });
        }
    }

    for model in &config.models {
        let (lo, hi) = model.difficulty_range;
        if lo < MIN_DIFFICULTY || hi > MAX_DIFFICULTY || lo > hi {
            errors.push(ConfigError::Validation {
                message: format!(
                    "model `{}` difficulty_range [{lo}, {hi}] must satisfy 1 <= lo <= hi <= 100",
                    model.id
                ),
            });
        }

        if model.is_local() {
            if model.accelerator.is_none() {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "local model `{}` must be assigned an accelerator",
                        model.id
                    ),
                });
            }
            if model.vram_required_mb == 0 {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "local model `{}` must declare vram_required_mb",
                        model.id
                    ),
                });
            }
        }

        if model.max_context_tokens == 0 {
            errors.push(ConfigError::Validation {
                message: format!("model `{}` max_context_tokens must be positive", model.id),
            });
        }
    }

    // Fusion weight must be a valid mixing coefficient.
    if !(0.0..=1.0).contains(&config.retrieval.alpha) {
        errors.push(ConfigError::Validation {
            message: format!(
                "retrieval.alpha must be in [0, 1], got {}",
                config.retrieval.alpha
            ),
        });
    }

    if config.retrieval.k_rrf <= 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "retrieval.k_rrf must be positive, got {}",
                config.retrieval.k_rrf
            ),
        });
    }

    if config.retrieval.top_k_final == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.top_k_final must be at least 1".to_string(),
        });
    }

    // Ledger constants must keep the admission formula meaningful.
    if config.ledger.safety_margin_fraction < 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "ledger.safety_margin_fraction must be non-negative, got {}",
                config.ledger.safety_margin_fraction
            ),
        });
    }

    if config.ledger.peak_multiplier < 1.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "ledger.peak_multiplier must be at least 1.0, got {}",
                config.ledger.peak_multiplier
            ),
        });
    }

    if config.ledger.max_models_per_accelerator == 0 {
        errors.push(ConfigError::Validation {
            message: "ledger.max_models_per_accelerator must be at least 1".to_string(),
        });
    }

    if config.budget.min_tokens == 0 || config.budget.min_tokens > config.budget.max_tokens {
        errors.push(ConfigError::Validation {
            message: format!(
                "budget bounds invalid: min_tokens {} must be in [1, max_tokens {}]",
                config.budget.min_tokens, config.budget.max_tokens
            ),
        });
    }

    if config.resilience.breaker.failure_threshold == 0 {
        errors.push(ConfigError::Validation {
            message: "resilience.breaker.failure_threshold must be at least 1".to_string(),
        });
    }

    if config.resilience.error_budget.max_errors == 0 {
        errors.push(ConfigError::Validation {
            message: "resilience.error_budget.max_errors must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
