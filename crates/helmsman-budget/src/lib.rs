// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adaptive token budgeting for the Helmsman orchestration core.
//!
//! Maps (query, difficulty, VRAM headroom, conversation length) to a
//! generation token ceiling via a deterministic, side-effect-free
//! calculation. Query types are classified with zero-cost heuristics
//! when not supplied by the caller.

pub mod budgeter;
pub mod classifier;

pub use budgeter::TokenBudgeter;
pub use classifier::{classify, QueryType};
