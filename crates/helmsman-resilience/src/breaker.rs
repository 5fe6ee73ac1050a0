// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-backend circuit breaker.
//!
//! Fails fast once a backend exceeds a consecutive-failure threshold, and
//! probes recovery after a timeout. Each named backend owns an
//! independent breaker; failures in one never open another's circuit.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use helmsman_config::model::BreakerConfig;
use helmsman_core::HelmsmanError;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitState {
    /// Calls pass through; consecutive failures are counted.
    Closed,
    /// Calls are rejected until the timeout elapses.
    Open,
    /// A probe call is in flight or recently succeeded; recovery pending.
    HalfOpen,
}

/// Point-in-time breaker status for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitStatus {
    pub backend: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    /// How long the circuit has been open, if it is.
    pub open_for_secs: Option<u64>,
}

struct CircuitRecord {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
    /// At most one probe call may be outstanding in HALF_OPEN.
    probe_in_flight: bool,
}

/// Failure-isolation state machine wrapping an arbitrary async callable.
pub struct CircuitBreaker {
    backend: String,
    config: BreakerConfig,
    record: Mutex<CircuitRecord>,
}

impl CircuitBreaker {
    /// Create a breaker for the named backend, starting CLOSED.
    pub fn new(backend: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            backend: backend.into(),
            config,
            record: Mutex::new(CircuitRecord {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Execute `f` under breaker protection.
    ///
    /// Returns `HelmsmanError::CircuitOpen` without invoking `f` when the
    /// circuit is open (or a probe is already in flight). Otherwise the
    /// call's outcome drives the state machine and is passed through.
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<T, HelmsmanError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, HelmsmanError>>,
    {
        self.acquire()?;
        match f().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }

    /// Admission check. Transitions OPEN -> HALF_OPEN when the timeout
    /// has elapsed, letting exactly one probe through.
    fn acquire(&self) -> Result<(), HelmsmanError> {
        let mut rec = self.record.lock().expect("breaker lock poisoned");
        match rec.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let opened_at = rec.opened_at.expect("open circuit without opened_at");
                if opened_at.elapsed() >= Duration::from_secs(self.config.timeout_seconds) {
                    rec.state = CircuitState::HalfOpen;
                    rec.consecutive_successes = 0;
                    rec.probe_in_flight = true;
                    info!(backend = %self.backend, "circuit half-open, probing");
                    Ok(())
                } else {
                    Err(HelmsmanError::CircuitOpen {
                        backend: self.backend.clone(),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if rec.probe_in_flight {
                    Err(HelmsmanError::CircuitOpen {
                        backend: self.backend.clone(),
                    })
                } else {
                    rec.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    fn record_success(&self) {
        let mut rec = self.record.lock().expect("breaker lock poisoned");
        match rec.state {
            CircuitState::Closed => {
                rec.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                rec.probe_in_flight = false;
                rec.consecutive_successes += 1;
                if rec.consecutive_successes >= self.config.success_threshold {
                    rec.state = CircuitState::Closed;
                    rec.consecutive_failures = 0;
                    rec.consecutive_successes = 0;
                    rec.opened_at = None;
                    info!(backend = %self.backend, "circuit closed after recovery");
                }
            }
            // A success cannot be recorded while OPEN: acquire() rejects
            // before the callable runs.
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self) {
        let mut rec = self.record.lock().expect("breaker lock poisoned");
        match rec.state {
            CircuitState::Closed => {
                rec.consecutive_failures += 1;
                if rec.consecutive_failures >= self.config.failure_threshold {
                    rec.state = CircuitState::Open;
                    rec.opened_at = Some(Instant::now());
                    warn!(
                        backend = %self.backend,
                        failures = rec.consecutive_failures,
                        "circuit opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                // Any probe failure reopens and resets the timeout clock.
                rec.state = CircuitState::Open;
                rec.opened_at = Some(Instant::now());
                rec.probe_in_flight = false;
                rec.consecutive_successes = 0;
                warn!(backend = %self.backend, "probe failed, circuit re-opened");
            }
            CircuitState::Open => {}
        }
    }

    /// Current state (for tests and observability).
    pub fn state(&self) -> CircuitState {
        self.record.lock().expect("breaker lock poisoned").state
    }

    /// Point-in-time status snapshot.
    pub fn status(&self) -> CircuitStatus {
        let rec = self.record.lock().expect("breaker lock poisoned");
        CircuitStatus {
            backend: self.backend.clone(),
            state: rec.state,
            consecutive_failures: rec.consecutive_failures,
            consecutive_successes: rec.consecutive_successes,
            open_for_secs: rec.opened_at.map(|t| t.elapsed().as_secs()),
        }
    }
}

/// Lazily-populated registry of per-backend breakers.
///
/// All breakers share one config; each backend name gets an independent
/// instance on first use.
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Fetch the breaker for `backend`, creating it on first use.
    pub fn get(&self, backend: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(backend.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(backend, self.config.clone()))
            })
            .clone()
    }

    /// Status of every registered breaker.
    pub fn statuses(&self) -> Vec<CircuitStatus> {
        self.breakers.iter().map(|entry| entry.status()).collect()
    }
}
