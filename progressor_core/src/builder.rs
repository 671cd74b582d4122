//! Builder for `Engine`.
//!
//! Transport, load cell, battery, and power control are required; config
//! and clock fall back to defaults. `build()` checks the collaborators and
//! the thresholds the engine relies on.

use std::sync::Arc;

use progressor_traits::{BatteryMonitor, Clock, LoadCell, MonotonicClock, PowerControl, Transport};
use tracing::debug;

use crate::config::EngineCfg;
use crate::dispatcher::Dispatcher;
use crate::engine::{Engine, EngineStats};
use crate::error::BuildError;
use crate::idle::IdleMonitor;
use crate::scheduler::StreamScheduler;
use crate::sensor::SensorSource;
use crate::state::EngineState;

#[derive(Default)]
pub struct EngineBuilder {
    transport: Option<Box<dyn Transport>>,
    load_cell: Option<Box<dyn LoadCell>>,
    battery: Option<Box<dyn BatteryMonitor>>,
    power: Option<Box<dyn PowerControl>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    cfg: EngineCfg,
}

impl EngineBuilder {
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn with_load_cell(mut self, cell: impl LoadCell + 'static) -> Self {
        self.load_cell = Some(Box::new(cell));
        self
    }

    /// Same as `with_load_cell` for an already-boxed backend chosen at runtime.
    pub fn with_boxed_load_cell(mut self, cell: Box<dyn LoadCell>) -> Self {
        self.load_cell = Some(cell);
        self
    }

    pub fn with_battery(mut self, battery: impl BatteryMonitor + 'static) -> Self {
        self.battery = Some(Box::new(battery));
        self
    }

    pub fn with_power(mut self, power: impl PowerControl + 'static) -> Self {
        self.power = Some(Box::new(power));
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_config(mut self, cfg: EngineCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn build(self) -> Result<Engine, BuildError> {
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        let cell = self.load_cell.ok_or(BuildError::MissingLoadCell)?;
        let battery = self.battery.ok_or(BuildError::MissingBattery)?;
        let power = self.power.ok_or(BuildError::MissingPower)?;
        let cfg = self.cfg;

        if cfg.stream.sample_interval_ms == 0 {
            return Err(BuildError::InvalidConfig("sample_interval_ms must be >= 1"));
        }
        if cfg.idle.timeout_ms == 0 {
            return Err(BuildError::InvalidConfig("idle timeout_ms must be >= 1"));
        }
        if cfg.idle.warning_lead_ms >= cfg.idle.timeout_ms {
            return Err(BuildError::InvalidConfig(
                "warning_lead_ms must be < timeout_ms",
            ));
        }
        if cfg.sensor.samples_per_read == 0 {
            return Err(BuildError::InvalidConfig("samples_per_read must be >= 1"));
        }
        if cfg.tick.0.is_zero() {
            return Err(BuildError::InvalidConfig("tick must be non-zero"));
        }
        if cfg.device.name.is_empty() {
            return Err(BuildError::InvalidConfig("device name must not be empty"));
        }

        let clock: Arc<dyn Clock + Send + Sync> = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let epoch = clock.now();

        debug!(
            device = %cfg.device.name,
            sample_interval_ms = cfg.stream.sample_interval_ms,
            idle_timeout_ms = cfg.idle.timeout_ms,
            "engine built"
        );

        Ok(Engine {
            transport,
            sensor: SensorSource::new(cell, cfg.sensor.samples_per_read),
            battery,
            power,
            clock,
            epoch,
            state: EngineState::new(0),
            dispatcher: Dispatcher::new(cfg.device),
            scheduler: StreamScheduler::new(cfg.stream),
            idle: IdleMonitor::new(cfg.idle),
            tick: cfg.tick.0,
            stats: EngineStats::default(),
            hibernated: None,
        })
    }
}
