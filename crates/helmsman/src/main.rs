// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helmsman - a multi-backend LLM orchestration core.
//!
//! This binary wires configuration into the orchestrator for one-shot
//! queries and status inspection. Interactive front ends, speech I/O,
//! and HTTP serving live outside this repository and consume the same
//! library crates.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod estimator;
mod query;
mod status;
mod wiring;

/// Helmsman - route queries across local and remote LLM backends.
#[derive(Parser, Debug)]
#[command(name = "helmsman", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a single query and exit.
    Query {
        /// The query text.
        prompt: String,
        /// Pre-computed difficulty (1-100); estimated when omitted.
        #[arg(long)]
        difficulty: Option<u8>,
        /// Specialty tag earning matching models a selection bonus.
        #[arg(long)]
        specialty: Option<String>,
        /// Force a specific catalog model id.
        #[arg(long)]
        model: Option<String>,
    },
    /// Print catalog and accelerator status.
    Status,
    /// Validate configuration and echo the resolved values.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match helmsman_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            helmsman_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.runtime.log_level);

    match cli.command {
        Some(Commands::Query {
            prompt,
            difficulty,
            specialty,
            model,
        }) => {
            query::run(&config, &prompt, difficulty, specialty, model).await;
        }
        Some(Commands::Status) => {
            status::run(&config).await;
        }
        Some(Commands::Config) => {
            status::print_config(&config);
        }
        None => {
            println!("helmsman: use --help for available commands");
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
