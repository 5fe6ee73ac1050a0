// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembles the orchestrator from validated configuration.

use std::sync::Arc;

use helmsman_config::HelmsmanConfig;
use helmsman_core::{AcceleratorProbe, AcceleratorSnapshot, HelmsmanError, RemoteBackend};
use helmsman_ledger::ResourceLedger;
use helmsman_memory::{HashEmbedder, HybridMemoryIndex};
use helmsman_orchestrator::ModelOrchestrator;
use helmsman_remote::OpenAiCompatClient;
use tracing::warn;

use crate::estimator::HeuristicEstimator;

/// Embedding dimensionality for the built-in bag-of-words embedder.
const EMBEDDING_DIM: usize = 256;

/// Build an orchestrator with remote drivers registered from the catalog.
///
/// Local descriptors stay catalogued; without a local engine attached
/// they fail over to the next candidate, which keeps a remote-only
/// deployment fully functional with the same configuration file.
pub fn build_orchestrator(config: &HelmsmanConfig) -> ModelOrchestrator {
    let ledger = Arc::new(ResourceLedger::new(
        accelerator_probe(),
        config.ledger.clone(),
    ));
    let memory = Arc::new(HybridMemoryIndex::new(
        Arc::new(HashEmbedder::new(EMBEDDING_DIM)),
        config.retrieval.clone(),
    ));

    let mut orchestrator = ModelOrchestrator::new(
        config.models.clone(),
        config.orchestrator.clone(),
        config.resilience.clone(),
        config.budget.clone(),
        ledger,
        memory,
        Arc::new(HeuristicEstimator),
    );

    for descriptor in config.models.iter().filter(|d| !d.is_local()) {
        match OpenAiCompatClient::from_descriptor(descriptor, &config.remote) {
            Ok(client) => {
                orchestrator.register_remote(&descriptor.id, Arc::new(client) as Arc<dyn RemoteBackend>);
            }
            Err(err) => {
                warn!(model = %descriptor.id, error = %err, "skipping remote driver");
            }
        }
    }

    orchestrator
}

/// The live accelerator probe for this build.
#[cfg(feature = "nvml")]
pub fn accelerator_probe() -> Arc<dyn AcceleratorProbe> {
    match helmsman_ledger::NvmlProbe::new() {
        Ok(probe) => Arc::new(probe),
        Err(err) => {
            warn!(error = %err, "NVML unavailable, local models will not load");
            Arc::new(UnavailableProbe)
        }
    }
}

/// The live accelerator probe for this build.
#[cfg(not(feature = "nvml"))]
pub fn accelerator_probe() -> Arc<dyn AcceleratorProbe> {
    Arc::new(UnavailableProbe)
}

/// Probe used when no device driver is compiled in. Every query fails,
/// which makes admission reject local loads and the orchestrator fall
/// through to remote backends.
struct UnavailableProbe;

impl AcceleratorProbe for UnavailableProbe {
    fn snapshot(&self, accelerator: u32) -> Result<AcceleratorSnapshot, HelmsmanError> {
        Err(HelmsmanError::Internal(format!(
            "no accelerator probe available for device {accelerator}; build with the `nvml` feature"
        )))
    }
}
