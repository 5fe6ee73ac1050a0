// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot query subcommand.

use helmsman_config::HelmsmanConfig;
use helmsman_orchestrator::RespondOptions;

use crate::wiring::build_orchestrator;

/// Route a single query through the orchestrator and print the reply.
pub async fn run(
    config: &HelmsmanConfig,
    prompt: &str,
    difficulty: Option<u8>,
    specialty: Option<String>,
    model: Option<String>,
) {
    if config.models.is_empty() {
        eprintln!("helmsman: no models configured; add [[model]] blocks to helmsman.toml");
        std::process::exit(1);
    }

    let orchestrator = build_orchestrator(config);

    let opts = RespondOptions {
        difficulty,
        specialty,
        force_model: model,
        conversation_turns: 0,
    };
    let reply = orchestrator.respond(prompt, opts).await;

    match &reply.model_id {
        Some(model_id) => {
            println!("{}", reply.text);
            if let Some(meta) = &reply.meta {
                eprintln!("[{model_id}, {} ms, {} max tokens]", meta.latency_ms, meta.max_tokens);
            }
        }
        None => {
            eprintln!("{}", reply.text);
            orchestrator.shutdown().await;
            std::process::exit(2);
        }
    }

    orchestrator.shutdown().await;
}
