// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window error budget with cooldown.
//!
//! Any backend call site records failures here to decide "is this
//! subsystem currently too unreliable to use". Once `max_errors` events
//! land within the window, the subsystem enters a cooldown during which
//! `can_execute()` is false regardless of window contents. Cooldown end
//! is lazy (checked on the next call), not a timer callback.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use helmsman_config::model::ErrorBudgetConfig;
use serde::Serialize;
use tokio::time::Instant;
use tracing::warn;

/// Coarse classification of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Timeout,
    RateLimit,
    Backend,
    Resource,
    Internal,
}

/// Point-in-time budget status for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBudgetStatus {
    pub subsystem: String,
    /// Errors currently inside the window.
    pub count: usize,
    /// Errors remaining before cooldown triggers.
    pub remaining: usize,
    pub in_cooldown: bool,
    /// Seconds of cooldown left, if any.
    pub cooldown_remaining_secs: Option<u64>,
}

struct BudgetWindow {
    events: VecDeque<(Instant, ErrorCategory)>,
    cooldown_until: Option<Instant>,
}

/// Sliding-window failure quota for one subsystem.
///
/// All mutation paths are serialized by a single mutex; this is the only
/// shared-state contract.
pub struct ErrorBudget {
    subsystem: String,
    config: ErrorBudgetConfig,
    window: Mutex<BudgetWindow>,
}

impl ErrorBudget {
    pub fn new(subsystem: impl Into<String>, config: ErrorBudgetConfig) -> Self {
        Self {
            subsystem: subsystem.into(),
            config,
            window: Mutex::new(BudgetWindow {
                events: VecDeque::new(),
                cooldown_until: None,
            }),
        }
    }

    /// Record a failure. Returns true if the budget is now exceeded and
    /// further calls should be blocked.
    pub fn record_error(&self, category: ErrorCategory) -> bool {
        let mut win = self.window.lock().expect("budget lock poisoned");
        let now = Instant::now();
        Self::purge(&mut win.events, now, self.config.window_seconds);
        win.events.push_back((now, category));

        if win.events.len() >= self.config.max_errors {
            let cooldown = Duration::from_secs(self.config.cooldown_seconds);
            win.cooldown_until = Some(now + cooldown);
            win.events.clear();
            warn!(
                subsystem = %self.subsystem,
                category = %category,
                cooldown_secs = self.config.cooldown_seconds,
                "error budget exhausted, entering cooldown"
            );
            true
        } else {
            false
        }
    }

    /// True unless the subsystem is in cooldown.
    pub fn can_execute(&self) -> bool {
        let mut win = self.window.lock().expect("budget lock poisoned");
        let now = Instant::now();
        if let Some(until) = win.cooldown_until {
            if now < until {
                return false;
            }
            // Cooldown elapsed; clear it lazily.
            win.cooldown_until = None;
        }
        true
    }

    /// Point-in-time status snapshot.
    pub fn status(&self) -> ErrorBudgetStatus {
        let mut win = self.window.lock().expect("budget lock poisoned");
        let now = Instant::now();
        Self::purge(&mut win.events, now, self.config.window_seconds);

        let cooldown_remaining = win.cooldown_until.and_then(|until| {
            let remaining = until.saturating_duration_since(now);
            (remaining > Duration::ZERO).then_some(remaining)
        });

        ErrorBudgetStatus {
            subsystem: self.subsystem.clone(),
            count: win.events.len(),
            remaining: self.config.max_errors.saturating_sub(win.events.len()),
            in_cooldown: cooldown_remaining.is_some(),
            cooldown_remaining_secs: cooldown_remaining.map(|d| d.as_secs()),
        }
    }

    /// Clear the window and any active cooldown.
    pub fn reset(&self) {
        let mut win = self.window.lock().expect("budget lock poisoned");
        win.events.clear();
        win.cooldown_until = None;
    }

    fn purge(
        events: &mut VecDeque<(Instant, ErrorCategory)>,
        now: Instant,
        window_seconds: u64,
    ) {
        let horizon = Duration::from_secs(window_seconds);
        while let Some((ts, _)) = events.front() {
            if now.saturating_duration_since(*ts) > horizon {
                events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Lazily-populated registry of per-subsystem error budgets.
pub struct ErrorBudgetRegistry {
    config: ErrorBudgetConfig,
    budgets: DashMap<String, Arc<ErrorBudget>>,
}

impl ErrorBudgetRegistry {
    pub fn new(config: ErrorBudgetConfig) -> Self {
        Self {
            config,
            budgets: DashMap::new(),
        }
    }

    /// Fetch the budget for `subsystem`, creating it on first use.
    pub fn get(&self, subsystem: &str) -> Arc<ErrorBudget> {
        self.budgets
            .entry(subsystem.to_string())
            .or_insert_with(|| {
                Arc::new(ErrorBudget::new(subsystem, self.config.clone()))
            })
            .clone()
    }

    /// Status of every registered budget.
    pub fn statuses(&self) -> Vec<ErrorBudgetStatus> {
        self.budgets.iter().map(|entry| entry.status()).collect()
    }
}
