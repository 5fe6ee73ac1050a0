// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accelerator memory probe trait.

use serde::{Deserialize, Serialize};

use crate::error::HelmsmanError;

/// A point-in-time view of one accelerator's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorSnapshot {
    /// Memory currently in use, in MB.
    pub used_mb: u64,
    /// Total device memory, in MB.
    pub total_mb: u64,
}

impl AcceleratorSnapshot {
    /// Memory currently free, in MB.
    pub fn free_mb(&self) -> u64 {
        self.total_mb.saturating_sub(self.used_mb)
    }
}

/// Live accelerator memory source.
///
/// Admission checks query the device driver on every call; snapshots are
/// never cached across calls.
pub trait AcceleratorProbe: Send + Sync {
    /// Query current memory usage for the given device index.
    fn snapshot(&self, accelerator: u32) -> Result<AcceleratorSnapshot, HelmsmanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_mb_subtracts() {
        let snap = AcceleratorSnapshot {
            used_mb: 6000,
            total_mb: 24000,
        };
        assert_eq!(snap.free_mb(), 18000);
    }

    #[test]
    fn free_mb_saturates_at_zero() {
        let snap = AcceleratorSnapshot {
            used_mb: 25000,
            total_mb: 24000,
        };
        assert_eq!(snap.free_mb(), 0);
    }
}
