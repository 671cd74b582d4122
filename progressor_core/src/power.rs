//! Irreversible hibernation sequence.
//!
//! Steps run in a fixed order and each is best-effort: a failing step is
//! logged and the sequence moves on, so deep sleep is always reached.

use progressor_traits::{PowerControl, Transport};
use tracing::{info, warn};

use crate::hw_error::map_boxed;
use crate::sensor::SensorSource;

/// Outcome of each step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerDownReport {
    pub advertising_stopped: bool,
    pub transport_shut_down: bool,
    pub sensor_powered_down: bool,
    pub output_flushed: bool,
}

impl PowerDownReport {
    pub fn clean(&self) -> bool {
        self.advertising_stopped
            && self.transport_shut_down
            && self.sensor_powered_down
            && self.output_flushed
    }
}

pub fn power_down(
    transport: &mut dyn Transport,
    sensor: &mut SensorSource,
    power: &mut dyn PowerControl,
) -> PowerDownReport {
    let mut report = PowerDownReport::default();

    match transport.stop_advertising() {
        Ok(()) => report.advertising_stopped = true,
        Err(e) => warn!(error = %map_boxed(&e), "stop advertising failed; continuing power-down"),
    }
    match transport.shutdown() {
        Ok(()) => report.transport_shut_down = true,
        Err(e) => warn!(error = %map_boxed(&e), "transport shutdown failed; continuing power-down"),
    }
    match sensor.power_down() {
        Ok(()) => report.sensor_powered_down = true,
        Err(e) => warn!(error = %e, "sensor power-down failed; continuing power-down"),
    }
    match power.flush_output() {
        Ok(()) => report.output_flushed = true,
        Err(e) => warn!(error = %map_boxed(&e), "output flush failed; continuing power-down"),
    }

    info!(clean = report.clean(), "entering deep sleep");
    power.enter_deep_sleep();
    report
}
