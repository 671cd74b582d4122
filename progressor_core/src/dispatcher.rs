//! Opcode-driven command handling for the control point.

use progressor_traits::BatteryMonitor;
use tracing::{debug, info, warn};

use crate::codec::{CommandFrame, Opcode, ResponseFrame};
use crate::config::DeviceInfo;
use crate::sensor::SensorSource;
use crate::state::EngineState;

/// Result of handling one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing to send.
    Silent,
    /// Send this notification before any scheduled sample.
    Respond(ResponseFrame),
    /// Session ended; the power-down sequence must run now.
    Hibernate,
}

impl Dispatch {
    pub fn response(&self) -> Option<&ResponseFrame> {
        match self {
            Dispatch::Respond(r) => Some(r),
            _ => None,
        }
    }
}

/// Collaborators a command may touch.
pub struct DispatchCtx<'a> {
    pub state: &'a mut EngineState,
    pub sensor: &'a mut SensorSource,
    pub battery: &'a mut dyn BatteryMonitor,
    pub now_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    device: DeviceInfo,
}

impl Dispatcher {
    pub fn new(device: DeviceInfo) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Apply one command. The caller has already reset the idle clock.
    pub fn handle_command(&self, frame: &CommandFrame, ctx: DispatchCtx<'_>) -> Dispatch {
        let Some(op) = frame.known_opcode() else {
            let opcode = format!("0x{:02X}", frame.opcode);
            warn!(%opcode, "unknown opcode ignored");
            return Dispatch::Silent;
        };
        debug!(?op, payload_len = frame.payload.len(), "command received");

        match op {
            Opcode::Tare => {
                if let Err(e) = ctx.sensor.tare() {
                    warn!(error = %e, "tare failed");
                } else {
                    info!("tare");
                }
                Dispatch::Silent
            }
            Opcode::StartMeasurement => {
                ctx.state.start_session(ctx.now_ms);
                info!("measurement started");
                Dispatch::Silent
            }
            Opcode::StopMeasurement => {
                ctx.state.end_session();
                info!("measurement stopped");
                Dispatch::Silent
            }
            Opcode::Shutdown => {
                ctx.state.end_session();
                info!("shutdown requested");
                Dispatch::Hibernate
            }
            Opcode::SampleBattery => {
                let mv = ctx.battery.millivolts();
                debug!(millivolts = mv, "battery sampled");
                Dispatch::Respond(ResponseFrame::battery(mv))
            }
            Opcode::GetDeviceInfo => Dispatch::Respond(ResponseFrame::device_info(
                &self.device.name,
                self.device.version_major,
                self.device.version_minor,
            )),
        }
    }
}
