#![no_main]
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use progressor_core::{Engine, EngineStatus, decode_response};
use progressor_hardware::{FixedBattery, SimulatedLoadCell, SimulatedPower, SimulatedTransport};
use progressor_traits::ManualClock;

// Each input byte chunk is one control-point write; a 0xFF-prefixed chunk advances time instead.
fuzz_target!(|writes: Vec<Vec<u8>>| {
    let clock = ManualClock::new();
    let transport = SimulatedTransport::new();
    let link = transport.handle();
    let Ok(mut engine) = Engine::builder()
        .with_transport(transport)
        .with_load_cell(SimulatedLoadCell::sweep())
        .with_battery(FixedBattery::default())
        .with_power(SimulatedPower::new())
        .with_clock(Arc::new(clock.clone()))
        .build()
    else {
        return;
    };
    link.connect();

    for w in writes.iter().take(256) {
        match w.split_first() {
            Some((&0xFF, rest)) => clock.advance_ms(u64::from(rest.first().copied().unwrap_or(1))),
            _ => link.write(w),
        }
        let status = engine.step().expect("step never fails");
        for frame in link.take_sent() {
            assert!(decode_response(&frame).is_ok(), "engine sent undecodable frame");
        }
        if status == EngineStatus::Hibernating {
            break;
        }
    }
});
