// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The model orchestrator: single entry point for query dispatch.
//!
//! `respond` estimates difficulty, augments the prompt with retrieved
//! memory, selects candidates, ensures VRAM room through the resource
//! ledger, and dispatches generation under circuit-breaker and
//! error-budget protection. Backend failures of any kind become "try the
//! next candidate"; the remote tier is the last resort. No backend
//! exception ever crosses `respond`'s boundary — callers receive either
//! text with a model id or a clearly marked failure message.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use helmsman_budget::TokenBudgeter;
use helmsman_config::model::{OrchestratorConfig, ResilienceConfig, TokenBudgetConfig};
use helmsman_core::{
    clamp_difficulty, BackendKind, DifficultyEstimator, GenerationMeta, GenerationRequest,
    HelmsmanError, LocalEngine, ModelDescriptor, RemoteBackend, DEFAULT_DIFFICULTY,
};
use helmsman_ledger::{AcceleratorStats, ResourceLedger};
use helmsman_memory::HybridMemoryIndex;
use helmsman_resilience::{
    BreakerRegistry, CircuitStatus, ErrorBudgetRegistry, ErrorBudgetStatus, ErrorCategory,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::selection::{rank_candidates, rank_remote_fallback};

/// VRAM headroom assumed for backends that do not occupy an accelerator.
const REMOTE_VRAM_GB: f64 = 64.0;

/// Per-query routing inputs.
#[derive(Debug, Clone, Default)]
pub struct RespondOptions {
    /// Pre-computed difficulty; estimated from the query when absent.
    pub difficulty: Option<u8>,
    /// Specialty tag earning matching descriptors a selection bonus.
    pub specialty: Option<String>,
    /// Catalog id to use regardless of difficulty routing.
    pub force_model: Option<String>,
    /// Prior turns in this conversation, for token-budget decay.
    pub conversation_turns: usize,
}

impl RespondOptions {
    /// Options with a fixed difficulty and everything else defaulted.
    pub fn with_difficulty(difficulty: u8) -> Self {
        Self {
            difficulty: Some(difficulty),
            ..Self::default()
        }
    }
}

/// What the caller gets back: response text plus the model that produced
/// it, or the failure message with no model id.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    /// `None` marks the terminal failure message.
    pub model_id: Option<String>,
    /// Bookkeeping for the external learning/metrics collaborator.
    pub meta: Option<GenerationMeta>,
}

impl Reply {
    /// True when every backend, including the fallback tier, failed.
    pub fn is_failure(&self) -> bool {
        self.model_id.is_none()
    }
}

/// Observability snapshot consumed by the external health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStats {
    pub descriptor_count: usize,
    pub loaded_models: Vec<String>,
    pub accelerators: Vec<AcceleratorStats>,
    pub breakers: Vec<CircuitStatus>,
    pub error_budgets: Vec<ErrorBudgetStatus>,
}

/// Owns the model catalog and coordinates selection, loading, and
/// dispatch across local and remote backends.
pub struct ModelOrchestrator {
    catalog: Vec<ModelDescriptor>,
    config: OrchestratorConfig,
    ledger: Arc<ResourceLedger>,
    memory: Arc<HybridMemoryIndex>,
    estimator: Arc<dyn DifficultyEstimator>,
    budgeter: TokenBudgeter,
    breakers: BreakerRegistry,
    error_budgets: ErrorBudgetRegistry,
    engine: Option<Arc<dyn LocalEngine>>,
    remotes: HashMap<String, Arc<dyn RemoteBackend>>,
}

impl ModelOrchestrator {
    /// Create an orchestrator over an already-validated catalog.
    pub fn new(
        catalog: Vec<ModelDescriptor>,
        config: OrchestratorConfig,
        resilience: ResilienceConfig,
        budget: TokenBudgetConfig,
        ledger: Arc<ResourceLedger>,
        memory: Arc<HybridMemoryIndex>,
        estimator: Arc<dyn DifficultyEstimator>,
    ) -> Self {
        Self {
            catalog,
            config,
            ledger,
            memory,
            estimator,
            budgeter: TokenBudgeter::new(budget),
            breakers: BreakerRegistry::new(resilience.breaker),
            error_budgets: ErrorBudgetRegistry::new(resilience.error_budget),
            engine: None,
            remotes: HashMap::new(),
        }
    }

    /// Attach the local inference engine. Without one, local descriptors
    /// fail over to the next candidate.
    pub fn with_local_engine(mut self, engine: Arc<dyn LocalEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Register the driver for a remote-api catalog entry.
    pub fn register_remote(&mut self, model_id: impl Into<String>, backend: Arc<dyn RemoteBackend>) {
        self.remotes.insert(model_id.into(), backend);
    }

    /// Answer a query. Never returns an error: the worst case is the
    /// configured failure message with no model id.
    pub async fn respond(&self, query: &str, opts: RespondOptions) -> Reply {
        let difficulty = match opts.difficulty {
            Some(d) => clamp_difficulty(i64::from(d)),
            None => match self.estimator.estimate(query).await {
                Ok(d) => clamp_difficulty(i64::from(d)),
                Err(err) => {
                    warn!(error = %err, "difficulty estimation failed, assuming default");
                    DEFAULT_DIFFICULTY
                }
            },
        };

        let prompt = self.build_prompt(query).await;
        let specialty = opts.specialty.as_deref();

        let candidates = rank_candidates(
            &self.catalog,
            difficulty,
            specialty,
            opts.force_model.as_deref(),
            self.config.specialty_bonus,
        );

        let mut tried: HashSet<String> = HashSet::new();

        // Bounded by the catalog size to guarantee termination.
        for descriptor in candidates.into_iter().take(self.catalog.len()) {
            tried.insert(descriptor.id.clone());
            match self
                .attempt(descriptor, &prompt, query, difficulty, opts.conversation_turns)
                .await
            {
                Ok((text, meta)) => {
                    return Reply {
                        text,
                        model_id: Some(descriptor.id.clone()),
                        meta: Some(meta),
                    }
                }
                Err(err) => {
                    warn!(
                        model = %descriptor.id,
                        error = %err,
                        "backend attempt failed, trying next candidate"
                    );
                }
            }
        }

        // Last resort: the remote tier, by the same selection rule.
        let fallback =
            rank_remote_fallback(&self.catalog, difficulty, specialty, self.config.specialty_bonus);
        for descriptor in fallback {
            if tried.contains(&descriptor.id) {
                continue;
            }
            match self
                .attempt(descriptor, &prompt, query, difficulty, opts.conversation_turns)
                .await
            {
                Ok((text, meta)) => {
                    return Reply {
                        text,
                        model_id: Some(descriptor.id.clone()),
                        meta: Some(meta),
                    }
                }
                Err(err) => {
                    warn!(
                        model = %descriptor.id,
                        error = %err,
                        "remote fallback attempt failed"
                    );
                }
            }
        }

        let err = HelmsmanError::NoCandidateModel { difficulty };
        warn!(error = %err, "all backends exhausted, returning failure message");
        Reply {
            text: self.config.failure_message.clone(),
            model_id: None,
            meta: None,
        }
    }

    /// One protected attempt against one descriptor: error-budget gate,
    /// load (local), token budget, breaker-wrapped dispatch with deadline.
    async fn attempt(
        &self,
        descriptor: &ModelDescriptor,
        prompt: &str,
        query: &str,
        difficulty: u8,
        conversation_turns: usize,
    ) -> Result<(String, GenerationMeta), HelmsmanError> {
        let backend_name = descriptor.id.as_str();

        let error_budget = self.error_budgets.get(backend_name);
        if !error_budget.can_execute() {
            let remaining = error_budget
                .status()
                .cooldown_remaining_secs
                .unwrap_or_default();
            return Err(HelmsmanError::CooldownActive {
                subsystem: backend_name.to_string(),
                remaining: Duration::from_secs(remaining),
            });
        }

        if descriptor.is_local() {
            let engine = self.engine.as_deref().ok_or_else(|| HelmsmanError::Backend {
                name: backend_name.to_string(),
                message: "no local engine configured".into(),
                source: None,
            })?;
            if let Err(err) = self.ledger.ensure_loaded(descriptor, engine).await {
                error_budget.record_error(categorize(&err));
                return Err(err);
            }
        }

        let available_vram_gb = descriptor
            .accelerator
            .and_then(|acc| self.ledger.free_vram_gb(acc).ok())
            .unwrap_or(REMOTE_VRAM_GB);
        let max_tokens =
            self.budgeter
                .calculate(query, difficulty, None, available_vram_gb, conversation_turns);

        let request = GenerationRequest {
            prompt: prompt.to_string(),
            max_tokens,
            temperature: descriptor.default_temperature,
        };

        let breaker = self.breakers.get(backend_name);
        let deadline = Duration::from_secs(self.config.request_timeout_seconds);
        let started = tokio::time::Instant::now();

        let result = breaker
            .call(|| self.dispatch_with_deadline(descriptor, &request, deadline))
            .await;

        match result {
            Ok(text) => {
                if descriptor.is_local() {
                    self.ledger.touch(backend_name).await;
                }
                let latency_ms = started.elapsed().as_millis() as u64;
                info!(
                    model = %backend_name,
                    latency_ms,
                    max_tokens,
                    difficulty,
                    "generation succeeded"
                );
                Ok((
                    text,
                    GenerationMeta {
                        model_id: backend_name.to_string(),
                        latency_ms,
                        max_tokens,
                        difficulty,
                    },
                ))
            }
            Err(err) => {
                // A rejected call never reached the backend; only real
                // outcomes consume error budget.
                if !matches!(err, HelmsmanError::CircuitOpen { .. }) {
                    error_budget.record_error(categorize(&err));
                }
                Err(err)
            }
        }
    }

    /// Dispatch under the per-call deadline. A timed-out call counts as
    /// a breaker failure for that backend.
    async fn dispatch_with_deadline(
        &self,
        descriptor: &ModelDescriptor,
        request: &GenerationRequest,
        deadline: Duration,
    ) -> Result<String, HelmsmanError> {
        match tokio::time::timeout(deadline, self.dispatch(descriptor, request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(HelmsmanError::Timeout { duration: deadline }),
        }
    }

    /// Route the call to the backend kind's driver.
    async fn dispatch(
        &self,
        descriptor: &ModelDescriptor,
        request: &GenerationRequest,
    ) -> Result<String, HelmsmanError> {
        match descriptor.backend {
            BackendKind::LocalVllm | BackendKind::LocalTransformers => {
                self.ledger.generate(&descriptor.id, request).await
            }
            BackendKind::RemoteApi => {
                let backend =
                    self.remotes
                        .get(&descriptor.id)
                        .ok_or_else(|| HelmsmanError::Backend {
                            name: descriptor.id.clone(),
                            message: "remote backend not registered".into(),
                            source: None,
                        })?;
                backend.generate(request).await
            }
        }
    }

    /// Prepend retrieved memory context to the query.
    async fn build_prompt(&self, query: &str) -> String {
        let context = self.memory.search(query).await;
        if context.is_empty() {
            return query.to_string();
        }

        let mut prompt = String::from("Relevant context from past conversations:\n");
        for hit in &context {
            prompt.push_str("- ");
            prompt.push_str(&hit.text);
            prompt.push('\n');
        }
        prompt.push('\n');
        prompt.push_str(query);
        prompt
    }

    /// Observability snapshot for the external health endpoint.
    pub async fn get_stats(&self) -> OrchestratorStats {
        let mut accelerator_ids: Vec<u32> =
            self.catalog.iter().filter_map(|d| d.accelerator).collect();
        accelerator_ids.sort_unstable();
        accelerator_ids.dedup();

        let mut accelerators = Vec::new();
        for accelerator in accelerator_ids {
            if let Ok(stats) = self.ledger.accelerator_stats(accelerator).await {
                accelerators.push(stats);
            }
        }

        OrchestratorStats {
            descriptor_count: self.catalog.len(),
            loaded_models: self.ledger.loaded_ids().await,
            accelerators,
            breakers: self.breakers.statuses(),
            error_budgets: self.error_budgets.statuses(),
        }
    }

    /// Release every loaded model. Called once at process shutdown.
    pub async fn shutdown(&self) {
        self.ledger.evict_all().await;
    }
}

fn categorize(err: &HelmsmanError) -> ErrorCategory {
    match err {
        HelmsmanError::Timeout { .. } => ErrorCategory::Timeout,
        HelmsmanError::ResourceExhausted { .. } => ErrorCategory::Resource,
        HelmsmanError::Internal(_) => ErrorCategory::Internal,
        _ => ErrorCategory::Backend,
    }
}
