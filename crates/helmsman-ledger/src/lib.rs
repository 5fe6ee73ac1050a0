// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accelerator resource ledger for the Helmsman orchestration core.
//!
//! Gates model loads against live accelerator memory (with a configurable
//! safety margin and peak multiplier), enforces a per-accelerator
//! resident-model cap with LRU eviction, and exclusively owns every
//! loaded-model handle.
//!
//! The optional `nvml` feature provides a live probe backed by the
//! NVIDIA Management Library; tests use fabricated probes.

pub mod ledger;

#[cfg(feature = "nvml")]
pub mod nvml;

pub use ledger::{AcceleratorStats, ResourceLedger};

#[cfg(feature = "nvml")]
pub use nvml::NvmlProbe;
