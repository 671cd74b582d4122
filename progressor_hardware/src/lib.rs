//! Simulated and physical collaborators for the Progressor emulator.
//!
//! The simulated backends share state through cheap `Rc` handles so a test
//! (or the CLI) can keep poking at the link and the load while the engine
//! owns the trait objects.
pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod hx711;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use progressor_traits::{BatteryMonitor, BoxError, Clock, LoadCell, PowerControl, Transport};

use crate::error::HwError;

/// Battery level reported by the simulated backend (3.7 V).
pub const DEFAULT_BATTERY_MV: u32 = 3700;

// ── Journal ──────────────────────────────────────────────────────────────────

/// Ordered record of lifecycle calls across simulated collaborators.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<&'static str>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: &'static str) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }
}

// ── Load cell ────────────────────────────────────────────────────────────────

/// Signal shape produced by `SimulatedLoadCell`.
#[derive(Debug, Clone)]
pub enum SimSignal {
    /// Triangle wave: +0.5 kg per read up past 50 kg, then -0.3 kg per read down below 5 kg.
    Sweep,
    /// Whatever the handle's load is set to (starts at the given value).
    Constant(f32),
    /// `(t_ms, kg)` points replayed stepwise against elapsed time since construction.
    Profile(Vec<(u64, f32)>),
}

#[derive(Debug, Default)]
struct SimLoadShared {
    load_kg: Cell<f32>,
    unready: Cell<bool>,
    fail_reads: Cell<bool>,
    fail_power_down: Cell<bool>,
    powered_down: Cell<bool>,
    reads: Cell<u32>,
}

/// Test/CLI handle onto a `SimulatedLoadCell`.
#[derive(Debug, Clone, Default)]
pub struct SimLoadHandle(Rc<SimLoadShared>);

impl SimLoadHandle {
    /// Set the load used by `SimSignal::Constant`.
    pub fn set_load(&self, kg: f32) {
        self.0.load_kg.set(kg);
    }
    pub fn set_ready(&self, ready: bool) {
        self.0.unready.set(!ready);
    }
    pub fn fail_reads(&self, fail: bool) {
        self.0.fail_reads.set(fail);
    }
    pub fn fail_power_down(&self, fail: bool) {
        self.0.fail_power_down.set(fail);
    }
    pub fn is_powered_down(&self) -> bool {
        self.0.powered_down.get()
    }
    /// Number of successful `read_raw` calls.
    pub fn reads(&self) -> u32 {
        self.0.reads.get()
    }
}

/// Simulated load cell implementation
pub struct SimulatedLoadCell {
    signal: SimSignal,
    shared: SimLoadHandle,
    sweep_kg: f32,
    sweep_rising: bool,
    reference_kg: f32,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    epoch: Option<Instant>,
    journal: Option<Journal>,
}

impl SimulatedLoadCell {
    pub fn sweep() -> Self {
        Self::with_signal(SimSignal::Sweep)
    }

    pub fn constant(kg: f32) -> Self {
        Self::with_signal(SimSignal::Constant(kg))
    }

    /// Replay a weight profile; time is measured on `clock` from this call.
    pub fn profile(points: Vec<(u64, f32)>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        let mut cell = Self::with_signal(SimSignal::Profile(points));
        cell.clock = Some(clock);
        cell.epoch = Some(epoch);
        cell
    }

    fn with_signal(signal: SimSignal) -> Self {
        let shared = SimLoadHandle::default();
        if let SimSignal::Constant(kg) = signal {
            shared.set_load(kg);
        }
        Self {
            signal,
            shared,
            sweep_kg: 25.5,
            sweep_rising: true,
            reference_kg: 0.0,
            clock: None,
            epoch: None,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn handle(&self) -> SimLoadHandle {
        self.shared.clone()
    }

    /// Current signal without advancing the sweep.
    fn current_kg(&self) -> f32 {
        match &self.signal {
            SimSignal::Sweep => self.sweep_kg,
            SimSignal::Constant(_) => self.shared.0.load_kg.get(),
            SimSignal::Profile(points) => {
                let elapsed = match (&self.clock, self.epoch) {
                    (Some(c), Some(e)) => c.ms_since(e),
                    _ => 0,
                };
                points
                    .iter()
                    .take_while(|(t, _)| *t <= elapsed)
                    .last()
                    .or(points.first())
                    .map_or(0.0, |(_, kg)| *kg)
            }
        }
    }

    fn advance_sweep(&mut self) {
        if self.sweep_rising {
            self.sweep_kg += 0.5;
            if self.sweep_kg > 50.0 {
                self.sweep_rising = false;
            }
        } else {
            self.sweep_kg -= 0.3;
            if self.sweep_kg < 5.0 {
                self.sweep_rising = true;
            }
        }
    }
}

impl LoadCell for SimulatedLoadCell {
    fn is_ready(&self) -> bool {
        !self.shared.0.unready.get() && !self.shared.0.powered_down.get()
    }

    fn read_raw(&mut self, _samples: u8) -> Result<f32, BoxError> {
        if self.shared.0.fail_reads.get() {
            return Err(Box::new(HwError::Injected("load cell read")));
        }
        if !self.is_ready() {
            return Err(Box::new(HwError::DataReadyTimeout));
        }
        if matches!(self.signal, SimSignal::Sweep) {
            self.advance_sweep();
        }
        self.shared.0.reads.set(self.shared.0.reads.get().saturating_add(1));
        let kg = self.current_kg() - self.reference_kg;
        tracing::trace!(kg, "simulated load cell read");
        Ok(kg)
    }

    fn tare_reference(&mut self) -> Result<(), BoxError> {
        self.reference_kg = self.current_kg();
        tracing::debug!(reference_kg = self.reference_kg, "simulated load cell tared");
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), BoxError> {
        if let Some(j) = &self.journal {
            j.record("sensor_power_down");
        }
        if self.shared.0.fail_power_down.get() {
            return Err(Box::new(HwError::Injected("load cell power-down")));
        }
        self.shared.0.powered_down.set(true);
        Ok(())
    }
}

// ── Transport ────────────────────────────────────────────────────────────────

/// Transport lifecycle call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    Notify,
    StopAdvertising,
    Shutdown,
}

#[derive(Debug)]
struct LinkShared {
    connected: bool,
    advertising: bool,
    shut_down: bool,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    faults: Vec<LinkFault>,
    polls: u64,
}

impl Default for LinkShared {
    fn default() -> Self {
        Self {
            connected: false,
            advertising: true,
            shut_down: false,
            inbound: VecDeque::new(),
            sent: Vec::new(),
            faults: Vec::new(),
            polls: 0,
        }
    }
}

/// Central-side view of a `SimulatedTransport`.
#[derive(Debug, Clone, Default)]
pub struct SimLinkHandle(Rc<RefCell<LinkShared>>);

impl SimLinkHandle {
    pub fn connect(&self) {
        let mut s = self.0.borrow_mut();
        if !s.shut_down {
            s.connected = true;
        }
    }

    /// Drop the link; undelivered writes are lost with it.
    pub fn disconnect(&self) {
        let mut s = self.0.borrow_mut();
        s.connected = false;
        s.inbound.clear();
    }

    /// Write a frame to the control point. Ignored while disconnected.
    pub fn write(&self, bytes: &[u8]) {
        let mut s = self.0.borrow_mut();
        if s.connected {
            s.inbound.push_back(bytes.to_vec());
        }
    }

    /// Drain every notification sent so far.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.0.borrow_mut().sent)
    }

    pub fn inject(&self, fault: LinkFault) {
        self.0.borrow_mut().faults.push(fault);
    }

    pub fn is_connected(&self) -> bool {
        self.0.borrow().connected
    }

    pub fn is_advertising(&self) -> bool {
        self.0.borrow().advertising
    }

    pub fn is_shut_down(&self) -> bool {
        self.0.borrow().shut_down
    }

    pub fn polls(&self) -> u64 {
        self.0.borrow().polls
    }
}

/// In-memory peripheral link driven through a `SimLinkHandle`.
#[derive(Default)]
pub struct SimulatedTransport {
    link: SimLinkHandle,
    journal: Option<Journal>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn handle(&self) -> SimLinkHandle {
        self.link.clone()
    }

    fn faulted(&self, fault: LinkFault) -> bool {
        self.link.0.borrow().faults.contains(&fault)
    }

    fn record(&self, entry: &'static str) {
        if let Some(j) = &self.journal {
            j.record(entry);
        }
    }
}

impl Transport for SimulatedTransport {
    fn poll(&mut self) {
        let mut s = self.link.0.borrow_mut();
        s.polls = s.polls.saturating_add(1);
    }

    fn take_write(&mut self) -> Option<Vec<u8>> {
        self.link.0.borrow_mut().inbound.pop_front()
    }

    fn send_notification(&mut self, payload: &[u8]) -> Result<(), BoxError> {
        if self.faulted(LinkFault::Notify) {
            return Err(Box::new(HwError::Injected("notify")));
        }
        let mut s = self.link.0.borrow_mut();
        if !s.connected {
            return Err(Box::new(HwError::NotConnected));
        }
        s.sent.push(payload.to_vec());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.link.0.borrow().connected
    }

    fn stop_advertising(&mut self) -> Result<(), BoxError> {
        self.record("stop_advertising");
        if self.faulted(LinkFault::StopAdvertising) {
            return Err(Box::new(HwError::Injected("stop advertising")));
        }
        self.link.0.borrow_mut().advertising = false;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), BoxError> {
        self.record("transport_shutdown");
        if self.faulted(LinkFault::Shutdown) {
            return Err(Box::new(HwError::Injected("transport shutdown")));
        }
        let mut s = self.link.0.borrow_mut();
        s.shut_down = true;
        s.connected = false;
        s.inbound.clear();
        Ok(())
    }
}

// ── Battery & power ──────────────────────────────────────────────────────────

/// Battery that always reports the same voltage.
#[derive(Debug, Clone, Copy)]
pub struct FixedBattery(pub u32);

impl Default for FixedBattery {
    fn default() -> Self {
        Self(DEFAULT_BATTERY_MV)
    }
}

impl BatteryMonitor for FixedBattery {
    fn millivolts(&mut self) -> u32 {
        self.0
    }
}

/// Records that deep sleep was requested instead of halting the process.
#[derive(Default)]
pub struct SimulatedPower {
    slept: Rc<Cell<bool>>,
    journal: Option<Journal>,
}

impl SimulatedPower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Shared flag that flips to true once deep sleep was entered.
    pub fn slept_flag(&self) -> Rc<Cell<bool>> {
        self.slept.clone()
    }
}

impl PowerControl for SimulatedPower {
    fn flush_output(&mut self) -> Result<(), BoxError> {
        if let Some(j) = &self.journal {
            j.record("flush_output");
        }
        Ok(())
    }

    fn enter_deep_sleep(&mut self) {
        if let Some(j) = &self.journal {
            j.record("deep_sleep");
        }
        tracing::info!("simulated deep sleep entered");
        self.slept.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_rises_then_falls() {
        let mut cell = SimulatedLoadCell::sweep();
        let first = cell.read_raw(1).unwrap();
        assert!((first - 26.0).abs() < 1e-6);
        let mut prev = first;
        let mut saw_fall = false;
        for _ in 0..200 {
            let w = cell.read_raw(1).unwrap();
            if w < prev {
                saw_fall = true;
            }
            assert!((4.0..=51.0).contains(&w), "sweep out of band: {w}");
            prev = w;
        }
        assert!(saw_fall);
    }

    #[test]
    fn tare_makes_constant_load_read_zero() {
        let mut cell = SimulatedLoadCell::constant(12.5);
        let h = cell.handle();
        assert_eq!(cell.read_raw(1).unwrap(), 12.5);
        cell.tare_reference().unwrap();
        assert_eq!(cell.read_raw(1).unwrap(), 0.0);
        h.set_load(14.0);
        assert!((cell.read_raw(1).unwrap() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn unready_cell_refuses_reads() {
        let mut cell = SimulatedLoadCell::constant(1.0);
        let h = cell.handle();
        h.set_ready(false);
        assert!(!cell.is_ready());
        assert!(cell.read_raw(1).is_err());
        assert_eq!(h.reads(), 0);
    }

    #[test]
    fn link_drops_writes_while_disconnected() {
        let mut t = SimulatedTransport::new();
        let h = t.handle();
        h.write(&[0x65]);
        assert!(t.take_write().is_none());
        h.connect();
        assert!(h.is_connected() && t.is_connected());
        h.write(&[0x65]);
        assert_eq!(t.take_write(), Some(vec![0x65]));
        assert!(t.send_notification(&[1, 2]).is_ok());
        h.disconnect();
        assert!(t.send_notification(&[1, 2]).is_err());
        assert_eq!(h.take_sent(), vec![vec![1, 2]]);
    }

    #[test]
    fn injected_fault_fails_only_that_step() {
        let mut t = SimulatedTransport::new();
        let h = t.handle();
        h.inject(LinkFault::StopAdvertising);
        assert!(t.stop_advertising().is_err());
        assert!(h.is_advertising());
        assert!(t.shutdown().is_ok());
        assert!(h.is_shut_down());
    }
}
