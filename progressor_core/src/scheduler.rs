//! Decides on each tick whether a weight notification is due.

use tracing::trace;

use crate::config::StreamCfg;
use crate::sensor::SensorSource;
use crate::state::EngineState;
use crate::util::session_timestamp_us;

/// One weight reading stamped relative to the measurement session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSample {
    pub weight_kg: f32,
    pub timestamp_us: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct StreamScheduler {
    interval_ms: u64,
}

impl StreamScheduler {
    pub fn new(cfg: StreamCfg) -> Self {
        Self {
            interval_ms: cfg.sample_interval_ms.max(1),
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// True when measuring and either no sample went out this session or the interval elapsed.
    pub fn is_due(&self, state: &EngineState, now_ms: u64) -> bool {
        state.measurement_active
            && state
                .last_sample_sent_ms
                .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms)
    }

    /// Produce a sample if one is due. The sensor is only read when it is.
    pub fn tick(
        &self,
        state: &mut EngineState,
        now_ms: u64,
        sensor: &mut SensorSource,
    ) -> Option<MeasurementSample> {
        if !self.is_due(state, now_ms) {
            return None;
        }
        let weight_kg = sensor.sample_weight_kg(state);
        let timestamp_us = session_timestamp_us(now_ms, state.session_start_ms);
        state.last_sample_sent_ms = Some(now_ms);
        trace!(weight_kg, timestamp_us, "sample due");
        Some(MeasurementSample {
            weight_kg,
            timestamp_us,
        })
    }
}
