// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NVML-backed accelerator probe (feature `nvml`).
//!
//! Queries live per-device memory through the NVIDIA Management Library.
//! There is no fallback to fabricated values: if NVML is unavailable the
//! constructor fails and the caller must wire a different probe
//! explicitly.

use helmsman_core::{AcceleratorProbe, AcceleratorSnapshot, HelmsmanError};
use nvml_wrapper::Nvml;
use tracing::info;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Accelerator probe backed by the NVIDIA Management Library.
pub struct NvmlProbe {
    nvml: Nvml,
    device_count: u32,
}

impl NvmlProbe {
    /// Initialize NVML and detect devices.
    ///
    /// Fails when the driver is not loaded, the library is missing, or
    /// no devices are present.
    pub fn new() -> Result<Self, HelmsmanError> {
        let nvml = Nvml::init().map_err(|e| {
            HelmsmanError::Internal(format!("NVML initialization failed: {e:?}"))
        })?;

        let device_count = nvml.device_count().map_err(|e| {
            HelmsmanError::Internal(format!("NVML device count query failed: {e:?}"))
        })?;

        if device_count == 0 {
            return Err(HelmsmanError::Internal(
                "NVML reports no accelerator devices".into(),
            ));
        }

        info!(devices = device_count, "NVML probe initialized");
        Ok(Self { nvml, device_count })
    }

    /// Number of detected devices.
    pub fn device_count(&self) -> u32 {
        self.device_count
    }
}

impl AcceleratorProbe for NvmlProbe {
    fn snapshot(&self, accelerator: u32) -> Result<AcceleratorSnapshot, HelmsmanError> {
        let device = self.nvml.device_by_index(accelerator).map_err(|e| {
            HelmsmanError::Internal(format!("NVML device {accelerator} access failed: {e:?}"))
        })?;

        let memory = device.memory_info().map_err(|e| {
            HelmsmanError::Internal(format!(
                "NVML memory query failed for device {accelerator}: {e:?}"
            ))
        })?;

        Ok(AcceleratorSnapshot {
            used_mb: memory.used / BYTES_PER_MIB,
            total_mb: memory.total / BYTES_PER_MIB,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires an NVIDIA GPU and loaded driver"]
    fn probe_reports_plausible_memory() {
        let probe = NvmlProbe::new().unwrap();
        let snapshot = probe.snapshot(0).unwrap();
        assert!(snapshot.total_mb > 0);
        assert!(snapshot.used_mb <= snapshot.total_mb);
    }
}
