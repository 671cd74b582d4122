//! Idle/hibernation monitor.
//!
//! Tracks how long the device has sat disconnected without activity. The
//! warning fires once per idle period at `timeout - lead`; reaching `timeout`
//! asks the engine to power down. Evaluation is cooperative: the engine
//! calls `evaluate` only while no central is connected.

use tracing::{info, warn};

use crate::config::IdleCfg;
use crate::state::EngineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePhase {
    Active,
    WarningIssued,
    Hibernating,
}

/// What a single evaluation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    None,
    Warning { remaining_ms: u64 },
    Hibernate,
}

#[derive(Debug, Clone, Copy)]
pub struct IdleMonitor {
    cfg: IdleCfg,
}

impl IdleMonitor {
    pub fn new(cfg: IdleCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &IdleCfg {
        &self.cfg
    }

    /// Connection change, inbound write, or sample sent: restart the idle period.
    pub fn note_activity(&self, state: &mut EngineState, now_ms: u64) {
        state.idle_since_ms = now_ms;
        state.hibernation_warning_issued = false;
    }

    pub fn idle_ms(&self, state: &EngineState, now_ms: u64) -> u64 {
        now_ms.saturating_sub(state.idle_since_ms)
    }

    pub fn phase(&self, state: &EngineState) -> IdlePhase {
        if state.hibernation_warning_issued {
            IdlePhase::WarningIssued
        } else {
            IdlePhase::Active
        }
    }

    /// Advance the idle state machine. Call only while disconnected.
    pub fn evaluate(&self, state: &mut EngineState, now_ms: u64) -> IdleEvent {
        let idle_ms = self.idle_ms(state, now_ms);
        if idle_ms >= self.cfg.timeout_ms {
            info!(idle_ms, "idle timeout reached; hibernating");
            return IdleEvent::Hibernate;
        }
        if !state.hibernation_warning_issued && idle_ms >= self.cfg.warning_at_ms() {
            state.hibernation_warning_issued = true;
            let remaining_ms = self.cfg.timeout_ms - idle_ms;
            warn!(idle_ms, remaining_ms, "hibernation warning");
            return IdleEvent::Warning { remaining_ms };
        }
        IdleEvent::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> IdleMonitor {
        IdleMonitor::new(IdleCfg {
            timeout_ms: 1_000,
            warning_lead_ms: 200,
        })
    }

    #[test]
    fn warns_once_then_hibernates() {
        let m = monitor();
        let mut st = EngineState::new(0);
        assert_eq!(m.evaluate(&mut st, 799), IdleEvent::None);
        assert_eq!(
            m.evaluate(&mut st, 800),
            IdleEvent::Warning { remaining_ms: 200 }
        );
        assert_eq!(m.phase(&st), IdlePhase::WarningIssued);
        for t in 801..1_000 {
            assert_eq!(m.evaluate(&mut st, t), IdleEvent::None);
        }
        assert_eq!(m.evaluate(&mut st, 1_000), IdleEvent::Hibernate);
    }

    #[test]
    fn activity_clears_warning_and_restarts_clock() {
        let m = monitor();
        let mut st = EngineState::new(0);
        assert!(matches!(m.evaluate(&mut st, 900), IdleEvent::Warning { .. }));
        m.note_activity(&mut st, 950);
        assert_eq!(m.phase(&st), IdlePhase::Active);
        assert_eq!(m.evaluate(&mut st, 1_500), IdleEvent::None);
        assert!(matches!(m.evaluate(&mut st, 1_750), IdleEvent::Warning { .. }));
        assert_eq!(m.evaluate(&mut st, 1_950), IdleEvent::Hibernate);
    }

    #[test]
    fn zero_lead_goes_straight_to_hibernate() {
        let m = IdleMonitor::new(IdleCfg {
            timeout_ms: 100,
            warning_lead_ms: 0,
        });
        let mut st = EngineState::new(0);
        assert_eq!(m.evaluate(&mut st, 99), IdleEvent::None);
        assert_eq!(m.evaluate(&mut st, 100), IdleEvent::Hibernate);
    }
}
