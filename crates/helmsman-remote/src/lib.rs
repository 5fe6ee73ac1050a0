// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote backend driver for OpenAI-compatible chat-completions APIs.
//!
//! Implements the [`RemoteBackend`] trait over HTTP with bearer
//! authentication and single-retry handling of transient errors; the
//! orchestrator's circuit breaker and error budget interpret anything
//! that still fails.
//!
//! [`RemoteBackend`]: helmsman_core::RemoteBackend

pub mod client;
pub mod types;

pub use client::OpenAiCompatClient;
pub use types::{ChatMessage, ChatRequest, ChatResponse};
