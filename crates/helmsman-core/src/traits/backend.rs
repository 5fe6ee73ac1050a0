// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend driver traits for local inference engines and remote APIs.

use async_trait::async_trait;

use crate::catalog::ModelDescriptor;
use crate::error::HelmsmanError;
use crate::types::GenerationRequest;

/// A local inference engine capable of materializing catalog entries
/// into loaded models (vLLM, Transformers, ...).
#[async_trait]
pub trait LocalEngine: Send + Sync {
    /// Load the model described by `descriptor` onto its accelerator.
    ///
    /// Load failures (OOM, missing weights, driver errors) surface as
    /// errors here; the orchestrator treats them as backend failures and
    /// moves to the next candidate.
    async fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Box<dyn LoadedModel>, HelmsmanError>;
}

/// An opaque handle to a model resident on an accelerator.
///
/// Handles are exclusively owned by the resource ledger; nothing else
/// holds one across a suspension point.
#[async_trait]
pub trait LoadedModel: Send + Sync {
    /// Run a generation call against the resident model.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, HelmsmanError>;

    /// Release backend resources and free accelerator memory.
    async fn unload(&self) -> Result<(), HelmsmanError>;
}

/// A remote LLM API reached over HTTP.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Backend name used for circuit-breaker and error-budget bookkeeping.
    fn name(&self) -> &str;

    /// Run a generation call against the remote API.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, HelmsmanError>;
}
