#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use progressor_core::{Engine, EngineCfg, EngineStatus, IdleCfg, Response, decode_response};
use progressor_hardware::{
    FixedBattery, Journal, SimLinkHandle, SimLoadHandle, SimulatedLoadCell, SimulatedPower,
    SimulatedTransport,
};
use progressor_traits::ManualClock;

pub const TIMEOUT_MS: u64 = 1_000;
pub const LEAD_MS: u64 = 200;
pub const TICK_MS: u64 = 10;

/// Engine wired to simulated collaborators on a manual clock.
pub struct Rig {
    pub engine: Engine,
    pub clock: ManualClock,
    pub link: SimLinkHandle,
    pub load: SimLoadHandle,
    pub journal: Journal,
    pub slept: Rc<Cell<bool>>,
}

pub fn short_idle_cfg() -> EngineCfg {
    EngineCfg {
        idle: IdleCfg {
            timeout_ms: TIMEOUT_MS,
            warning_lead_ms: LEAD_MS,
        },
        ..EngineCfg::default()
    }
}

impl Rig {
    pub fn new() -> Self {
        Self::with_cell(SimulatedLoadCell::constant(10.0))
    }

    pub fn with_cell(cell: SimulatedLoadCell) -> Self {
        Self::build(cell, short_idle_cfg())
    }

    pub fn build(cell: SimulatedLoadCell, cfg: EngineCfg) -> Self {
        let clock = ManualClock::new();
        let journal = Journal::new();
        let cell = cell.with_journal(journal.clone());
        let load = cell.handle();
        let transport = SimulatedTransport::new().with_journal(journal.clone());
        let link = transport.handle();
        let power = SimulatedPower::new().with_journal(journal.clone());
        let slept = power.slept_flag();
        let engine = Engine::builder()
            .with_transport(transport)
            .with_load_cell(cell)
            .with_battery(FixedBattery(3700))
            .with_power(power)
            .with_clock(Arc::new(clock.clone()))
            .with_config(cfg)
            .build()
            .expect("engine builds");
        Self {
            engine,
            clock,
            link,
            load,
            journal,
            slept,
        }
    }

    pub fn step(&mut self) -> EngineStatus {
        self.engine.step().expect("step")
    }

    /// Advance the clock by one tick, then step.
    pub fn tick(&mut self) -> EngineStatus {
        self.clock.advance_ms(TICK_MS);
        self.step()
    }

    /// Tick until `ms` of clock time has passed; stops early on hibernation.
    pub fn run_for(&mut self, ms: u64) -> EngineStatus {
        let mut status = EngineStatus::Running;
        for _ in 0..ms / TICK_MS {
            status = self.tick();
            if status == EngineStatus::Hibernating {
                break;
            }
        }
        status
    }

    /// Connect a central and let the engine observe it.
    pub fn connect(&mut self) {
        self.link.connect();
        self.step();
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.link.write(bytes);
    }

    /// Everything notified since the last call, decoded the way a central would.
    pub fn received(&self) -> Vec<Response> {
        self.link
            .take_sent()
            .iter()
            .map(|b| decode_response(b).expect("well-formed notification"))
            .collect()
    }

    pub fn now_ms(&self) -> u64 {
        self.engine.now_ms()
    }
}

pub fn weights(responses: &[Response]) -> Vec<(f32, u32)> {
    responses
        .iter()
        .filter_map(|r| match r {
            Response::Weight { kg, timestamp_us } => Some((*kg, *timestamp_us)),
            _ => None,
        })
        .collect()
}
