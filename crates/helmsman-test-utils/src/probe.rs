// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fabricated accelerator states for ledger tests.

use std::collections::HashMap;
use std::sync::Mutex;

use helmsman_core::{AcceleratorProbe, AcceleratorSnapshot, HelmsmanError};

/// An accelerator probe backed by fabricated, mutable states.
pub struct StaticProbe {
    states: Mutex<HashMap<u32, AcceleratorSnapshot>>,
}

impl StaticProbe {
    /// Create a probe with no devices.
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Set (or replace) a device's memory state.
    pub fn set(&self, accelerator: u32, used_mb: u64, total_mb: u64) {
        self.states
            .lock()
            .expect("probe lock poisoned")
            .insert(accelerator, AcceleratorSnapshot { used_mb, total_mb });
    }

    /// Increase a device's used memory, as a model load would.
    pub fn consume(&self, accelerator: u32, mb: u64) {
        let mut states = self.states.lock().expect("probe lock poisoned");
        if let Some(snap) = states.get_mut(&accelerator) {
            snap.used_mb = snap.used_mb.saturating_add(mb);
        }
    }

    /// Decrease a device's used memory, as an eviction would.
    pub fn release(&self, accelerator: u32, mb: u64) {
        let mut states = self.states.lock().expect("probe lock poisoned");
        if let Some(snap) = states.get_mut(&accelerator) {
            snap.used_mb = snap.used_mb.saturating_sub(mb);
        }
    }

    /// Direct snapshot access for assertions.
    pub fn snapshot_of(&self, accelerator: u32) -> AcceleratorSnapshot {
        self.states
            .lock()
            .expect("probe lock poisoned")
            .get(&accelerator)
            .copied()
            .unwrap_or(AcceleratorSnapshot {
                used_mb: 0,
                total_mb: 0,
            })
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceleratorProbe for StaticProbe {
    fn snapshot(&self, accelerator: u32) -> Result<AcceleratorSnapshot, HelmsmanError> {
        self.states
            .lock()
            .expect("probe lock poisoned")
            .get(&accelerator)
            .copied()
            .ok_or_else(|| HelmsmanError::Internal(format!("unknown accelerator {accelerator}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_returns_configured_state() {
        let probe = StaticProbe::new();
        probe.set(0, 6000, 24000);
        let snap = probe.snapshot(0).unwrap();
        assert_eq!(snap.used_mb, 6000);
        assert_eq!(snap.free_mb(), 18000);
    }

    #[test]
    fn unknown_device_errors() {
        let probe = StaticProbe::new();
        assert!(probe.snapshot(3).is_err());
    }

    #[test]
    fn consume_and_release_adjust_usage() {
        let probe = StaticProbe::new();
        probe.set(0, 1000, 8000);
        probe.consume(0, 3000);
        assert_eq!(probe.snapshot_of(0).used_mb, 4000);
        probe.release(0, 2000);
        assert_eq!(probe.snapshot_of(0).used_mb, 2000);
        probe.release(0, 9999);
        assert_eq!(probe.snapshot_of(0).used_mb, 0);
    }
}
