//! Fixed-cadence driver loop around `Engine::step`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::engine::Engine;
use crate::error::Result;
use crate::status::EngineStatus;

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Power-down sequence ran; the engine is terminal.
    Hibernated,
    /// Stopped externally (shutdown flag or step budget) while still running.
    Stopped,
}

/// Step `engine` every `tick` until it hibernates, `shutdown` is raised, or
/// `max_steps` iterations have run. Sleeps on the engine clock, so a manual
/// clock drives the loop deterministically.
pub fn run(
    engine: &mut Engine,
    tick: Duration,
    shutdown: &Arc<AtomicBool>,
    max_steps: Option<u64>,
) -> Result<RunOutcome> {
    let clock = engine.clock();
    let mut steps: u64 = 0;
    tracing::info!(
        device = %engine.device().name,
        tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX),
        "engine loop start"
    );

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(steps, "engine loop stopped");
            return Ok(RunOutcome::Stopped);
        }
        if max_steps.is_some_and(|m| steps >= m) {
            tracing::info!(steps, "step budget exhausted");
            return Ok(RunOutcome::Stopped);
        }
        match engine.step()? {
            EngineStatus::Running => {}
            EngineStatus::Hibernating => {
                tracing::info!(steps, "engine hibernated");
                return Ok(RunOutcome::Hibernated);
            }
        }
        steps = steps.saturating_add(1);
        clock.sleep(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progressor_hardware::{FixedBattery, SimulatedLoadCell, SimulatedPower, SimulatedTransport};
    use progressor_traits::ManualClock;

    use crate::config::{EngineCfg, IdleCfg};

    fn engine(clock: &ManualClock, timeout_ms: u64) -> Engine {
        Engine::builder()
            .with_transport(SimulatedTransport::new())
            .with_load_cell(SimulatedLoadCell::constant(1.0))
            .with_battery(FixedBattery::default())
            .with_power(SimulatedPower::new())
            .with_clock(Arc::new(clock.clone()))
            .with_config(EngineCfg {
                idle: IdleCfg {
                    timeout_ms,
                    warning_lead_ms: timeout_ms / 2,
                },
                ..EngineCfg::default()
            })
            .build()
            .expect("engine")
    }

    #[test]
    fn step_budget_stops_loop() {
        let clock = ManualClock::new();
        let mut e = engine(&clock, 60_000);
        let stop = Arc::new(AtomicBool::new(false));
        let out = run(&mut e, Duration::from_millis(10), &stop, Some(5)).unwrap();
        assert_eq!(out, RunOutcome::Stopped);
        assert_eq!(e.stats().steps, 5);
        assert_eq!(clock.elapsed_ms(), 50);
    }

    #[test]
    fn shutdown_flag_stops_before_first_step() {
        let clock = ManualClock::new();
        let mut e = engine(&clock, 60_000);
        let stop = Arc::new(AtomicBool::new(true));
        let out = run(&mut e, Duration::from_millis(10), &stop, None).unwrap();
        assert_eq!(out, RunOutcome::Stopped);
        assert_eq!(e.stats().steps, 0);
    }

    #[test]
    fn idle_timeout_ends_loop_in_hibernation() {
        let clock = ManualClock::new();
        let mut e = engine(&clock, 200);
        let stop = Arc::new(AtomicBool::new(false));
        let out = run(&mut e, Duration::from_millis(10), &stop, Some(1_000)).unwrap();
        assert_eq!(out, RunOutcome::Hibernated);
        assert!(e.is_hibernating());
        assert_eq!(clock.elapsed_ms(), 200);
    }
}
