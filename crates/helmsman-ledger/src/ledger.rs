// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! VRAM ledger: load admission and LRU eviction.
//!
//! The ledger gates model loads against live accelerator memory and owns
//! every [`LoadedModel`] handle. The enforce-capacity -> admit -> load
//! sequence is serialized per accelerator id so two concurrent queries
//! cannot jointly admit loads that exceed VRAM; independent accelerators
//! never contend.

use std::collections::HashMap;
use std::sync::Arc;

use helmsman_config::model::LedgerConfig;
use helmsman_core::{
    AcceleratorProbe, AcceleratorSnapshot, GenerationRequest, HelmsmanError, LoadedModel,
    LocalEngine, ModelDescriptor,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// One resident model. Created on load, destroyed on eviction; exclusively
/// owned by the ledger.
struct LoadedEntry {
    descriptor: ModelDescriptor,
    model: Arc<dyn LoadedModel>,
    loaded_at: Instant,
    last_accessed_at: Instant,
}

/// Per-accelerator memory stats for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AcceleratorStats {
    pub accelerator: u32,
    pub used_mb: u64,
    pub total_mb: u64,
    pub free_mb: u64,
    pub loaded_models: Vec<String>,
}

/// Tracks VRAM usage per accelerator, admits or rejects model loads
/// against a safety margin, and selects LRU eviction candidates.
pub struct ResourceLedger {
    probe: Arc<dyn AcceleratorProbe>,
    config: LedgerConfig,
    loaded: Mutex<HashMap<String, LoadedEntry>>,
    /// One lock per accelerator id, scoped to the load/evict sequence.
    accelerator_locks: Mutex<HashMap<u32, Arc<Mutex<()>>>>,
}

impl ResourceLedger {
    pub fn new(probe: Arc<dyn AcceleratorProbe>, config: LedgerConfig) -> Self {
        Self {
            probe,
            config,
            loaded: Mutex::new(HashMap::new()),
            accelerator_locks: Mutex::new(HashMap::new()),
        }
    }

    /// VRAM a load must find free before it is admitted:
    /// `(vram + max(margin_fraction * vram, fixed_buffer)) * peak_multiplier`.
    pub fn required_mb(&self, descriptor: &ModelDescriptor) -> u64 {
        let vram = descriptor.vram_required_mb as f64;
        let margin = (self.config.safety_margin_fraction * vram)
            .max(self.config.fixed_buffer_mb as f64);
        ((vram + margin) * self.config.peak_multiplier).ceil() as u64
    }

    /// Admission check against a live accelerator snapshot.
    ///
    /// The device driver is queried on every call; snapshots are never
    /// cached. CPU-only and remote descriptors always admit.
    pub fn admit(&self, descriptor: &ModelDescriptor) -> Result<bool, HelmsmanError> {
        let Some(accelerator) = descriptor.accelerator else {
            return Ok(true);
        };
        if !descriptor.is_local() {
            return Ok(true);
        }

        let snapshot = self.probe.snapshot(accelerator)?;
        Ok(snapshot.free_mb() >= self.required_mb(descriptor))
    }

    /// True if a handle for `model_id` is currently resident.
    pub async fn is_loaded(&self, model_id: &str) -> bool {
        self.loaded.lock().await.contains_key(model_id)
    }

    /// Ensure `descriptor` is resident, loading it if necessary.
    ///
    /// The capacity-enforce -> admit -> load sequence runs under the
    /// accelerator's lock. Admission failure surfaces as
    /// `ResourceExhausted`; the orchestrator treats it like any other
    /// backend failure and moves on.
    pub async fn ensure_loaded(
        &self,
        descriptor: &ModelDescriptor,
        engine: &dyn LocalEngine,
    ) -> Result<(), HelmsmanError> {
        if !descriptor.is_local() {
            return Ok(());
        }
        let accelerator = descriptor.accelerator.ok_or_else(|| {
            HelmsmanError::Config(format!(
                "local model `{}` has no accelerator assignment",
                descriptor.id
            ))
        })?;

        if self.is_loaded(&descriptor.id).await {
            return Ok(());
        }

        let lock = self.accelerator_lock(accelerator).await;
        let _guard = lock.lock().await;

        // Re-check under the lock: a concurrent query may have loaded it.
        if self.is_loaded(&descriptor.id).await {
            return Ok(());
        }

        self.enforce_capacity(accelerator).await;

        if !self.admit(descriptor)? {
            let snapshot = self.probe.snapshot(accelerator)?;
            return Err(HelmsmanError::ResourceExhausted {
                accelerator,
                required_mb: self.required_mb(descriptor),
                available_mb: snapshot.free_mb(),
            });
        }

        let model: Arc<dyn LoadedModel> = Arc::from(engine.load(descriptor).await?);
        let now = Instant::now();
        self.loaded.lock().await.insert(
            descriptor.id.clone(),
            LoadedEntry {
                descriptor: descriptor.clone(),
                model,
                loaded_at: now,
                last_accessed_at: now,
            },
        );
        info!(model = %descriptor.id, accelerator, "model loaded");
        Ok(())
    }

    /// Evict the least-recently-used model on `accelerator` while the
    /// resident count is at or above the per-accelerator cap.
    pub async fn enforce_capacity(&self, accelerator: u32) {
        loop {
            let lru_id = {
                let loaded = self.loaded.lock().await;
                let resident: Vec<_> = loaded
                    .values()
                    .filter(|e| e.descriptor.accelerator == Some(accelerator))
                    .collect();
                if resident.len() < self.config.max_models_per_accelerator {
                    return;
                }
                resident
                    .iter()
                    .min_by_key(|e| e.last_accessed_at)
                    .map(|e| e.descriptor.id.clone())
            };

            match lru_id {
                Some(id) => {
                    self.evict(&id).await;
                }
                None => return,
            }
        }
    }

    /// Release a resident model's backend resources and drop its handle.
    ///
    /// Returns true if the model was resident. Unload failures are logged
    /// and the handle is dropped regardless; keeping a half-dead handle
    /// around is worse than a leaked allocation the driver will reclaim.
    pub async fn evict(&self, model_id: &str) -> bool {
        let entry = self.loaded.lock().await.remove(model_id);
        match entry {
            Some(entry) => {
                if let Err(err) = entry.model.unload().await {
                    warn!(model = %model_id, error = %err, "unload failed during eviction");
                }
                info!(
                    model = %model_id,
                    resident_secs = entry.loaded_at.elapsed().as_secs(),
                    "model evicted"
                );
                true
            }
            None => false,
        }
    }

    /// Evict every resident model (orchestrator shutdown).
    pub async fn evict_all(&self) {
        let ids: Vec<String> = self.loaded.lock().await.keys().cloned().collect();
        for id in ids {
            self.evict(&id).await;
        }
    }

    /// Mark `model_id` as used now. Called on every successful use, not
    /// on load alone.
    pub async fn touch(&self, model_id: &str) {
        if let Some(entry) = self.loaded.lock().await.get_mut(model_id) {
            entry.last_accessed_at = Instant::now();
        }
    }

    /// Run a generation call against a resident model.
    ///
    /// The handle stays owned by the ledger; only a clone of the backend
    /// Arc crosses the await.
    pub async fn generate(
        &self,
        model_id: &str,
        request: &GenerationRequest,
    ) -> Result<String, HelmsmanError> {
        let model = {
            let loaded = self.loaded.lock().await;
            loaded
                .get(model_id)
                .map(|e| Arc::clone(&e.model))
                .ok_or_else(|| HelmsmanError::ModelNotLoaded {
                    model: model_id.to_string(),
                })?
        };
        model.generate(request).await
    }

    /// Ids of all resident models.
    pub async fn loaded_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.loaded.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Live stats for one accelerator.
    pub async fn accelerator_stats(
        &self,
        accelerator: u32,
    ) -> Result<AcceleratorStats, HelmsmanError> {
        let snapshot = self.probe.snapshot(accelerator)?;
        let loaded = self.loaded.lock().await;
        let mut loaded_models: Vec<String> = loaded
            .values()
            .filter(|e| e.descriptor.accelerator == Some(accelerator))
            .map(|e| e.descriptor.id.clone())
            .collect();
        loaded_models.sort();
        Ok(AcceleratorStats {
            accelerator,
            used_mb: snapshot.used_mb,
            total_mb: snapshot.total_mb,
            free_mb: snapshot.free_mb(),
            loaded_models,
        })
    }

    /// Live free memory for an accelerator in GB, for the token budgeter.
    pub fn free_vram_gb(&self, accelerator: u32) -> Result<f64, HelmsmanError> {
        let snapshot = self.probe.snapshot(accelerator)?;
        Ok(snapshot.free_mb() as f64 / 1024.0)
    }

    /// Live snapshot pass-through for observability.
    pub fn snapshot(&self, accelerator: u32) -> Result<AcceleratorSnapshot, HelmsmanError> {
        self.probe.snapshot(accelerator)
    }

    async fn accelerator_lock(&self, accelerator: u32) -> Arc<Mutex<()>> {
        let mut locks = self.accelerator_locks.lock().await;
        locks
            .entry(accelerator)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helmsman_core::BackendKind;
    use helmsman_test_utils::{MockEngine, StaticProbe};

    fn local(id: &str, accelerator: u32, vram_mb: u64) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            backend: BackendKind::LocalVllm,
            path_or_endpoint: format!("/models/{id}"),
            accelerator: Some(accelerator),
            vram_required_mb: vram_mb,
            difficulty_range: (1, 100),
            quantization: None,
            max_context_tokens: 8192,
            default_temperature: 0.7,
            priority: 1,
            specialties: vec![],
            deprecated: false,
        }
    }

    fn remote(id: &str) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            backend: BackendKind::RemoteApi,
            path_or_endpoint: "https://api.example.com/v1".to_string(),
            accelerator: None,
            vram_required_mb: 0,
            difficulty_range: (1, 100),
            quantization: None,
            max_context_tokens: 128000,
            default_temperature: 0.7,
            priority: 99,
            specialties: vec![],
            deprecated: false,
        }
    }

    fn ledger_with(probe: Arc<StaticProbe>, config: LedgerConfig) -> ResourceLedger {
        ResourceLedger::new(probe, config)
    }

    #[test]
    fn required_mb_applies_margin_and_peak() {
        let probe = Arc::new(StaticProbe::new());
        let ledger = ledger_with(probe, LedgerConfig::default());
        // 8000 MB model: margin = max(0.15 * 8000, 512) = 1200;
        // (8000 + 1200) * 1.2 = 11040.
        assert_eq!(ledger.required_mb(&local("m", 0, 8000)), 11040);
        // 1000 MB model: fixed buffer dominates; (1000 + 512) * 1.2 = 1814.4 -> 1815.
        assert_eq!(ledger.required_mb(&local("m", 0, 1000)), 1815);
    }

    #[tokio::test]
    async fn admit_respects_live_free_memory() {
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 0, 24000);
        let ledger = ledger_with(Arc::clone(&probe), LedgerConfig::default());

        let model = local("m1", 0, 8000); // requires 11040
        assert!(ledger.admit(&model).unwrap());

        // Live state change is observed immediately, no cache.
        probe.set(0, 20000, 24000);
        assert!(!ledger.admit(&model).unwrap());
    }

    #[tokio::test]
    async fn remote_descriptors_always_admit() {
        let probe = Arc::new(StaticProbe::new());
        let ledger = ledger_with(probe, LedgerConfig::default());
        assert!(ledger.admit(&remote("r1")).unwrap());
    }

    #[tokio::test]
    async fn ensure_loaded_loads_once() {
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 0, 24000);
        let engine = MockEngine::with_probe(Arc::clone(&probe));
        let ledger = ledger_with(Arc::clone(&probe), LedgerConfig::default());

        let model = local("m1", 0, 8000);
        ledger.ensure_loaded(&model, &engine).await.unwrap();
        ledger.ensure_loaded(&model, &engine).await.unwrap();

        assert_eq!(engine.load_count(), 1);
        assert!(ledger.is_loaded("m1").await);
        assert_eq!(ledger.loaded_ids().await, vec!["m1".to_string()]);
    }

    #[tokio::test]
    async fn admission_failure_is_resource_exhausted() {
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 22000, 24000);
        let engine = MockEngine::with_probe(Arc::clone(&probe));
        let ledger = ledger_with(Arc::clone(&probe), LedgerConfig::default());

        let err = ledger
            .ensure_loaded(&local("m1", 0, 8000), &engine)
            .await
            .unwrap_err();
        assert!(matches!(err, HelmsmanError::ResourceExhausted { .. }));
        assert_eq!(engine.load_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_cap_evicts_lru() {
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 0, 64000);
        let engine = MockEngine::with_probe(Arc::clone(&probe));
        let config = LedgerConfig {
            max_models_per_accelerator: 2,
            ..LedgerConfig::default()
        };
        let ledger = ledger_with(Arc::clone(&probe), config);

        let m1 = local("m1", 0, 4000);
        let m2 = local("m2", 0, 4000);
        let m3 = local("m3", 0, 4000);

        ledger.ensure_loaded(&m1, &engine).await.unwrap();
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        ledger.ensure_loaded(&m2, &engine).await.unwrap();
        tokio::time::advance(std::time::Duration::from_secs(1)).await;

        // m1 is older, but a touch makes m2 the LRU candidate.
        ledger.touch("m1").await;
        ledger.ensure_loaded(&m3, &engine).await.unwrap();

        assert!(ledger.is_loaded("m1").await);
        assert!(!ledger.is_loaded("m2").await);
        assert!(ledger.is_loaded("m3").await);
        assert_eq!(engine.unload_count(), 1);
        // Eviction freed m2's memory before m3 consumed its own.
        assert_eq!(probe.snapshot_of(0).used_mb, 8000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_loads_serialize_per_accelerator() {
        // 24 GB device; each model requires (11000 + 1650) * 1.2 = 15180.
        // Both fit alone but not together: exactly one admission succeeds.
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 0, 24000);
        let engine = Arc::new(MockEngine::with_probe(Arc::clone(&probe)));
        let ledger = Arc::new(ledger_with(Arc::clone(&probe), LedgerConfig::default()));

        let a = local("big-a", 0, 11000);
        let b = local("big-b", 0, 11000);

        let (ra, rb) = tokio::join!(
            {
                let ledger = Arc::clone(&ledger);
                let engine = Arc::clone(&engine);
                let a = a.clone();
                async move { ledger.ensure_loaded(&a, engine.as_ref()).await }
            },
            {
                let ledger = Arc::clone(&ledger);
                let engine = Arc::clone(&engine);
                let b = b.clone();
                async move { ledger.ensure_loaded(&b, engine.as_ref()).await }
            },
        );

        let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one load must be admitted: {ra:?} {rb:?}");
        assert_eq!(engine.load_count(), 1);
    }

    #[tokio::test]
    async fn generate_requires_resident_model() {
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 0, 24000);
        let engine = MockEngine::with_probe(Arc::clone(&probe));
        let ledger = ledger_with(Arc::clone(&probe), LedgerConfig::default());

        let request = GenerationRequest {
            prompt: "hi".into(),
            max_tokens: 64,
            temperature: 0.7,
        };
        let err = ledger.generate("ghost", &request).await.unwrap_err();
        assert!(matches!(err, HelmsmanError::ModelNotLoaded { .. }));

        let m1 = local("m1", 0, 4000);
        ledger.ensure_loaded(&m1, &engine).await.unwrap();
        engine.push_response("generated text").await;
        assert_eq!(
            ledger.generate("m1", &request).await.unwrap(),
            "generated text"
        );
    }

    #[tokio::test]
    async fn evict_all_releases_everything() {
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 0, 64000);
        probe.set(1, 0, 64000);
        let engine = MockEngine::with_probe(Arc::clone(&probe));
        let ledger = ledger_with(Arc::clone(&probe), LedgerConfig::default());

        ledger
            .ensure_loaded(&local("m1", 0, 4000), &engine)
            .await
            .unwrap();
        ledger
            .ensure_loaded(&local("m2", 1, 4000), &engine)
            .await
            .unwrap();

        ledger.evict_all().await;
        assert!(ledger.loaded_ids().await.is_empty());
        assert_eq!(engine.unload_count(), 2);
        assert_eq!(probe.snapshot_of(0).used_mb, 0);
        assert_eq!(probe.snapshot_of(1).used_mb, 0);
    }

    #[tokio::test]
    async fn accelerator_stats_reflect_residency() {
        let probe = Arc::new(StaticProbe::new());
        probe.set(0, 0, 24000);
        let engine = MockEngine::with_probe(Arc::clone(&probe));
        let ledger = ledger_with(Arc::clone(&probe), LedgerConfig::default());

        ledger
            .ensure_loaded(&local("m1", 0, 4000), &engine)
            .await
            .unwrap();

        let stats = ledger.accelerator_stats(0).await.unwrap();
        assert_eq!(stats.used_mb, 4000);
        assert_eq!(stats.free_mb, 20000);
        assert_eq!(stats.loaded_models, vec!["m1".to_string()]);
    }
}
