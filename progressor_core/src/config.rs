//! Runtime configuration types for the protocol engine.
//!
//! These are the structs `Engine` consumes. They are separate from the
//! TOML-deserialized config in `progressor_config`.

use std::time::Duration;

/// Identity reported by the device-info opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub version_major: u8,
    pub version_minor: u8,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            name: "Progressor".to_string(),
            version_major: 1,
            version_minor: 0,
        }
    }
}

/// Measurement streaming cadence.
#[derive(Debug, Clone, Copy)]
pub struct StreamCfg {
    /// Minimum spacing between weight notifications (ms).
    pub sample_interval_ms: u64,
}

impl Default for StreamCfg {
    fn default() -> Self {
        Self {
            sample_interval_ms: 50,
        }
    }
}

/// Idle/hibernation thresholds.
#[derive(Debug, Clone, Copy)]
pub struct IdleCfg {
    /// Disconnected idle time before power-down (ms).
    pub timeout_ms: u64,
    /// Warning fires at `timeout_ms - warning_lead_ms`.
    pub warning_lead_ms: u64,
}

impl Default for IdleCfg {
    fn default() -> Self {
        Self {
            timeout_ms: 300_000,
            warning_lead_ms: 30_000,
        }
    }
}

impl IdleCfg {
    /// Idle duration at which the warning fires.
    pub fn warning_at_ms(&self) -> u64 {
        self.timeout_ms.saturating_sub(self.warning_lead_ms)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SensorCfg {
    /// Conversions averaged per sample.
    pub samples_per_read: u8,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self { samples_per_read: 1 }
    }
}

/// Everything the engine needs, bundled for the builder.
#[derive(Debug, Clone, Default)]
pub struct EngineCfg {
    pub device: DeviceInfo,
    pub stream: StreamCfg,
    pub idle: IdleCfg,
    pub sensor: SensorCfg,
    /// Loop cadence used by `runner::run`.
    pub tick: Tick,
}

#[derive(Debug, Clone, Copy)]
pub struct Tick(pub Duration);

impl Default for Tick {
    fn default() -> Self {
        Self(Duration::from_millis(10))
    }
}
