// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model orchestration for the Helmsman core.
//!
//! The [`ModelOrchestrator`] is the single entry point for queries: it
//! estimates difficulty, augments the prompt with retrieved memory,
//! selects a model by difficulty and priority, ensures VRAM room via the
//! resource ledger, and dispatches generation under circuit-breaker and
//! error-budget protection, falling back across the priority list and
//! finally to the remote tier.

pub mod orchestrator;
pub mod selection;

pub use orchestrator::{ModelOrchestrator, OrchestratorStats, Reply, RespondOptions};
pub use selection::{rank_candidates, rank_remote_fallback};
