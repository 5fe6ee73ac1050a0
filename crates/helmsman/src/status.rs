// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status and config subcommands.

use helmsman_config::HelmsmanConfig;

use crate::wiring::build_orchestrator;

/// Print the catalog and live accelerator state.
pub async fn run(config: &HelmsmanConfig) {
    let orchestrator = build_orchestrator(config);
    let stats = orchestrator.get_stats().await;

    println!("helmsman status");
    println!("  catalog: {} model(s)", stats.descriptor_count);
    for model in &config.models {
        let (lo, hi) = model.difficulty_range;
        println!(
            "    {} [{}] difficulty {lo}-{hi}, priority {}{}",
            model.id,
            model.backend,
            model.priority,
            if model.deprecated { " (deprecated)" } else { "" }
        );
    }

    if stats.accelerators.is_empty() {
        println!("  accelerators: none visible");
    } else {
        for acc in &stats.accelerators {
            println!(
                "  accelerator {}: {} / {} MB used, resident: {}",
                acc.accelerator,
                acc.used_mb,
                acc.total_mb,
                if acc.loaded_models.is_empty() {
                    "-".to_string()
                } else {
                    acc.loaded_models.join(", ")
                }
            );
        }
    }
}

/// Echo the resolved configuration after validation.
pub fn print_config(config: &HelmsmanConfig) {
    println!("helmsman config (validated)");
    println!("  runtime.log_level = {}", config.runtime.log_level);
    println!(
        "  orchestrator.request_timeout_seconds = {}",
        config.orchestrator.request_timeout_seconds
    );
    println!(
        "  ledger: margin {:.0}% + {} MB buffer, x{:.1} peak, {} model(s)/accelerator",
        config.ledger.safety_margin_fraction * 100.0,
        config.ledger.fixed_buffer_mb,
        config.ledger.peak_multiplier,
        config.ledger.max_models_per_accelerator
    );
    println!(
        "  resilience: {} failures open circuit for {}s; {} errors/{}s cool down {}s",
        config.resilience.breaker.failure_threshold,
        config.resilience.breaker.timeout_seconds,
        config.resilience.error_budget.max_errors,
        config.resilience.error_budget.window_seconds,
        config.resilience.error_budget.cooldown_seconds
    );
    println!(
        "  retrieval: top {} fused (alpha {:.2}, k_rrf {:.0})",
        config.retrieval.top_k_final, config.retrieval.alpha, config.retrieval.k_rrf
    );
    println!("  catalog: {} model(s)", config.models.len());
}
