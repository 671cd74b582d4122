//! `From` implementations bridging `progressor_config` types to `progressor_core` types.

use std::time::Duration;

use crate::config::{DeviceInfo, EngineCfg, IdleCfg, SensorCfg, StreamCfg, Tick};

// ── DeviceInfo ───────────────────────────────────────────────────────────────

impl From<&progressor_config::DeviceCfg> for DeviceInfo {
    fn from(c: &progressor_config::DeviceCfg) -> Self {
        Self {
            name: c.name.clone(),
            version_major: c.version_major,
            version_minor: c.version_minor,
        }
    }
}

// ── StreamCfg ────────────────────────────────────────────────────────────────

impl From<&progressor_config::StreamCfg> for StreamCfg {
    fn from(c: &progressor_config::StreamCfg) -> Self {
        Self {
            sample_interval_ms: c.sample_interval_ms,
        }
    }
}

// ── IdleCfg ──────────────────────────────────────────────────────────────────

impl From<&progressor_config::HibernationCfg> for IdleCfg {
    fn from(c: &progressor_config::HibernationCfg) -> Self {
        Self {
            timeout_ms: c.timeout_ms,
            warning_lead_ms: c.warning_lead_ms,
        }
    }
}

// ── SensorCfg ────────────────────────────────────────────────────────────────

impl From<&progressor_config::SensorCfg> for SensorCfg {
    fn from(c: &progressor_config::SensorCfg) -> Self {
        Self {
            samples_per_read: c.samples_per_read,
        }
    }
}

// ── EngineCfg ────────────────────────────────────────────────────────────────

impl From<&progressor_config::Config> for EngineCfg {
    fn from(c: &progressor_config::Config) -> Self {
        Self {
            device: (&c.device).into(),
            stream: (&c.stream).into(),
            idle: (&c.hibernation).into(),
            sensor: (&c.sensor).into(),
            tick: Tick(Duration::from_millis(c.engine.tick_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_match_core_defaults() {
        let cfg = progressor_config::load_toml("").unwrap();
        let core: EngineCfg = (&cfg).into();
        let defaults = EngineCfg::default();
        assert_eq!(core.device, defaults.device);
        assert_eq!(core.stream.sample_interval_ms, defaults.stream.sample_interval_ms);
        assert_eq!(core.idle.timeout_ms, defaults.idle.timeout_ms);
        assert_eq!(core.idle.warning_lead_ms, defaults.idle.warning_lead_ms);
        assert_eq!(core.sensor.samples_per_read, defaults.sensor.samples_per_read);
        assert_eq!(core.tick.0, defaults.tick.0);
    }
}
