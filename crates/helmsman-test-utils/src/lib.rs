// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mocks and fixtures for Helmsman tests.
//!
//! Everything here runs without GPUs, model weights, or network access:
//!
//! - [`MockEngine`] / [`MockLoadedModel`]: scripted local inference
//! - [`MockRemoteBackend`]: scripted remote API
//! - [`StaticProbe`]: fabricated accelerator memory states
//! - [`FailingEmbedder`]: scripted embedding failure
//! - [`FixedEstimator`] / [`FailingEstimator`]: difficulty fixtures

pub mod embedder;
pub mod estimator;
pub mod mock_engine;
pub mod mock_remote;
pub mod probe;

pub use embedder::FailingEmbedder;
pub use estimator::{FailingEstimator, FixedEstimator};
pub use mock_engine::{MockEngine, MockLoadedModel};
pub use mock_remote::MockRemoteBackend;
pub use probe::StaticProbe;
