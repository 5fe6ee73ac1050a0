// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model catalog types.
//!
//! A [`ModelDescriptor`] is an immutable catalog entry created from static
//! configuration at process start. The orchestrator selects among
//! descriptors; it never mutates them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which kind of backend serves a descriptor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Locally hosted model served through a vLLM engine.
    LocalVllm,
    /// Locally hosted model served through a Transformers engine.
    LocalTransformers,
    /// Remote LLM API reached over HTTP.
    RemoteApi,
}

impl BackendKind {
    /// True for backends that occupy accelerator memory.
    pub fn is_local(self) -> bool {
        matches!(self, BackendKind::LocalVllm | BackendKind::LocalTransformers)
    }
}

/// Immutable catalog entry describing one available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescriptor {
    /// Unique model id, also used as the circuit-breaker backend name.
    pub id: String,

    /// Backend kind serving this model.
    pub backend: BackendKind,

    /// Filesystem path (local) or HTTP endpoint (remote).
    pub path_or_endpoint: String,

    /// Accelerator device index. `None` for remote or CPU-only models.
    #[serde(default)]
    pub accelerator: Option<u32>,

    /// VRAM footprint of the loaded weights, in MB. Zero for remote models.
    #[serde(default)]
    pub vram_required_mb: u64,

    /// Inclusive [lo, hi] difficulty range this model is suited for.
    pub difficulty_range: (u8, u8),

    /// Quantization scheme, if any (e.g. "awq", "q4_k_m").
    #[serde(default)]
    pub quantization: Option<String>,

    /// Maximum context window in tokens.
    pub max_context_tokens: u32,

    /// Default sampling temperature for this model.
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Selection priority. Lower is preferred.
    pub priority: u32,

    /// Specialty tags (e.g. "code", "math") that earn a selection bonus.
    #[serde(default)]
    pub specialties: Vec<String>,

    /// Deprecated descriptors are excluded from selection entirely.
    #[serde(default)]
    pub deprecated: bool,
}

fn default_temperature() -> f32 {
    0.7
}

impl ModelDescriptor {
    /// True if `difficulty` falls within this descriptor's inclusive range.
    pub fn matches_difficulty(&self, difficulty: u8) -> bool {
        let (lo, hi) = self.difficulty_range;
        difficulty >= lo && difficulty <= hi
    }

    /// True if this descriptor carries the given specialty tag.
    pub fn has_specialty(&self, tag: &str) -> bool {
        self.specialties.iter().any(|s| s == tag)
    }

    /// True for descriptors that occupy accelerator memory when loaded.
    pub fn is_local(&self) -> bool {
        self.backend.is_local()
    }
}
