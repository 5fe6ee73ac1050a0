// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock local inference engine for deterministic testing.
//!
//! `MockEngine` implements `LocalEngine` with scripted load failures and
//! a FIFO queue of generation outcomes, enabling fast, CI-runnable tests
//! without GPUs or model weights.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::Mutex;

use helmsman_core::{GenerationRequest, HelmsmanError, LoadedModel, LocalEngine, ModelDescriptor};

use crate::probe::StaticProbe;

/// Scripted generation outcome: a response text or a failure message.
type Outcome = Result<String, String>;

/// A mock local engine with scripted load failures and generation outcomes.
///
/// Outcomes are popped from a FIFO queue shared by all models loaded from
/// this engine. When the queue is empty, a default "mock response" text is
/// returned.
pub struct MockEngine {
    fail_loads: StdMutex<HashSet<String>>,
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    loads: Arc<AtomicUsize>,
    unloads: Arc<AtomicUsize>,
    /// When set, loads debit VRAM from the probe and unloads credit it
    /// back, so admission checks observe the engine's activity.
    probe: Option<Arc<StaticProbe>>,
}

impl MockEngine {
    /// Create a mock engine with no scripted behavior.
    pub fn new() -> Self {
        Self {
            fail_loads: StdMutex::new(HashSet::new()),
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            loads: Arc::new(AtomicUsize::new(0)),
            unloads: Arc::new(AtomicUsize::new(0)),
            probe: None,
        }
    }

    /// Create a mock engine whose loads are reflected in `probe`.
    pub fn with_probe(probe: Arc<StaticProbe>) -> Self {
        let mut engine = Self::new();
        engine.probe = Some(probe);
        engine
    }

    /// Script a load failure for the given model id.
    pub fn fail_load(&self, model_id: &str) {
        self.fail_loads
            .lock()
            .expect("fail_loads lock poisoned")
            .insert(model_id.to_string());
    }

    /// Queue a successful generation outcome.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.outcomes.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failed generation outcome.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.outcomes.lock().await.push_back(Err(message.into()));
    }

    /// Number of successful loads so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of unloads so far.
    pub fn unload_count(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalEngine for MockEngine {
    async fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Box<dyn LoadedModel>, HelmsmanError> {
        let scripted_failure = self
            .fail_loads
            .lock()
            .expect("fail_loads lock poisoned")
            .contains(&descriptor.id);
        if scripted_failure {
            return Err(HelmsmanError::Backend {
                name: descriptor.id.clone(),
                message: "scripted load failure".into(),
                source: None,
            });
        }

        if let (Some(probe), Some(accelerator)) = (&self.probe, descriptor.accelerator) {
            probe.consume(accelerator, descriptor.vram_required_mb);
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockLoadedModel {
            model_id: descriptor.id.clone(),
            accelerator: descriptor.accelerator,
            vram_mb: descriptor.vram_required_mb,
            outcomes: Arc::clone(&self.outcomes),
            unloads: Arc::clone(&self.unloads),
            probe: self.probe.clone(),
        }))
    }
}

/// A model "loaded" by [`MockEngine`].
pub struct MockLoadedModel {
    model_id: String,
    accelerator: Option<u32>,
    vram_mb: u64,
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    unloads: Arc<AtomicUsize>,
    probe: Option<Arc<StaticProbe>>,
}

#[async_trait]
impl LoadedModel for MockLoadedModel {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, HelmsmanError> {
        match self.outcomes.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(HelmsmanError::Backend {
                name: self.model_id.clone(),
                message,
                source: None,
            }),
            None => Ok("mock response".to_string()),
        }
    }

    async fn unload(&self) -> Result<(), HelmsmanError> {
        if let (Some(probe), Some(accelerator)) = (&self.probe, self.accelerator) {
            probe.release(accelerator, self.vram_mb);
        }
        self.unloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
