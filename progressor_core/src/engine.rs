//! The cooperative engine step tying transport, dispatcher, scheduler, and idle monitor together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use progressor_traits::{BatteryMonitor, Clock, PowerControl, Transport};
use tracing::{debug, info, trace, warn};

use crate::builder::EngineBuilder;
use crate::codec::{ResponseFrame, decode_command};
use crate::config::DeviceInfo;
use crate::dispatcher::{Dispatch, DispatchCtx, Dispatcher};
use crate::error::Result;
use crate::hw_error::map_boxed;
use crate::idle::{IdleEvent, IdleMonitor, IdlePhase};
use crate::power::{self, PowerDownReport};
use crate::scheduler::StreamScheduler;
use crate::sensor::SensorSource;
use crate::state::EngineState;
use crate::status::EngineStatus;

/// Counters for observability; never influence protocol behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub steps: u64,
    pub commands: u64,
    pub malformed_frames: u64,
    pub samples_sent: u64,
    pub responses_sent: u64,
    pub notify_failures: u64,
    pub warnings_issued: u64,
}

pub struct Engine {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) sensor: SensorSource,
    pub(crate) battery: Box<dyn BatteryMonitor>,
    pub(crate) power: Box<dyn PowerControl>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) state: EngineState,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) scheduler: StreamScheduler,
    pub(crate) idle: IdleMonitor,
    pub(crate) tick: Duration,
    pub(crate) stats: EngineStats,
    pub(crate) hibernated: Option<PowerDownReport>,
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("device", self.dispatcher.device())
            .field("state", &self.state)
            .field("hibernated", &self.hibernated.is_some())
            .finish()
    }
}

impl Engine {
    /// Start building an Engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Milliseconds since the engine was built.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn device(&self) -> &DeviceInfo {
        self.dispatcher.device()
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    pub fn sample_interval_ms(&self) -> u64 {
        self.scheduler.interval_ms()
    }

    pub fn idle_phase(&self) -> IdlePhase {
        if self.hibernated.is_some() {
            IdlePhase::Hibernating
        } else {
            self.idle.phase(&self.state)
        }
    }

    /// Step-by-step outcome of the power-down sequence, once it has run.
    pub fn power_down_report(&self) -> Option<PowerDownReport> {
        self.hibernated
    }

    pub fn is_hibernating(&self) -> bool {
        self.hibernated.is_some()
    }

    /// Read the sensor once through the hold-last-valid policy.
    pub fn probe_weight_kg(&mut self) -> f32 {
        self.sensor.sample_weight_kg(&mut self.state)
    }

    /// One cooperative iteration: link changes, inbound commands, due sample,
    /// then (disconnected only) the idle monitor.
    pub fn step(&mut self) -> Result<EngineStatus> {
        if self.hibernated.is_some() {
            return Ok(EngineStatus::Hibernating);
        }
        self.stats.steps = self.stats.steps.saturating_add(1);
        let now = self.now_ms();

        self.transport.poll();
        self.track_link(now);

        while let Some(bytes) = self.transport.take_write() {
            self.idle.note_activity(&mut self.state, now);
            let frame = match decode_command(&bytes) {
                Ok(f) => f,
                Err(e) => {
                    self.stats.malformed_frames = self.stats.malformed_frames.saturating_add(1);
                    debug!(error = %e, "control point write ignored");
                    continue;
                }
            };
            self.stats.commands = self.stats.commands.saturating_add(1);
            let outcome = self.dispatcher.handle_command(
                &frame,
                DispatchCtx {
                    state: &mut self.state,
                    sensor: &mut self.sensor,
                    battery: &mut *self.battery,
                    now_ms: now,
                },
            );
            match outcome {
                Dispatch::Silent => {}
                Dispatch::Respond(resp) => {
                    if self.notify(&resp) {
                        self.stats.responses_sent = self.stats.responses_sent.saturating_add(1);
                    }
                }
                Dispatch::Hibernate => return Ok(self.hibernate()),
            }
        }

        if let Some(sample) = self.scheduler.tick(&mut self.state, now, &mut self.sensor) {
            let frame = ResponseFrame::weight(sample.weight_kg, sample.timestamp_us);
            if self.notify(&frame) {
                self.stats.samples_sent = self.stats.samples_sent.saturating_add(1);
                self.idle.note_activity(&mut self.state, now);
                trace!(
                    kg = sample.weight_kg,
                    timestamp_us = sample.timestamp_us,
                    "weight sample sent"
                );
            }
        }

        if !self.state.connected {
            match self.idle.evaluate(&mut self.state, now) {
                IdleEvent::None => {}
                IdleEvent::Warning { .. } => {
                    self.stats.warnings_issued = self.stats.warnings_issued.saturating_add(1);
                }
                IdleEvent::Hibernate => return Ok(self.hibernate()),
            }
        }

        Ok(EngineStatus::Running)
    }

    /// Handle connect/disconnect edges observed since the last step.
    fn track_link(&mut self, now: u64) {
        let connected = self.transport.is_connected();
        if connected == self.state.connected {
            return;
        }
        self.state.connected = connected;
        if connected {
            info!("central connected");
        } else {
            if self.state.measurement_active {
                info!("measurement stopped by disconnect");
            }
            self.state.end_session();
            info!("central disconnected");
        }
        self.idle.note_activity(&mut self.state, now);
    }

    /// Send one notification; failures are absorbed.
    fn notify(&mut self, frame: &ResponseFrame) -> bool {
        match self.transport.send_notification(frame.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                self.stats.notify_failures = self.stats.notify_failures.saturating_add(1);
                warn!(kind = ?frame.kind(), error = %map_boxed(&e), "notification dropped");
                false
            }
        }
    }

    fn hibernate(&mut self) -> EngineStatus {
        self.state.end_session();
        let report = power::power_down(&mut *self.transport, &mut self.sensor, &mut *self.power);
        self.hibernated = Some(report);
        EngineStatus::Hibernating
    }
}
