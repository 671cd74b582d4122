mod common;

use common::{LEAD_MS, Rig, TICK_MS, TIMEOUT_MS};
use progressor_core::{EngineStatus, IdlePhase};
use progressor_hardware::LinkFault;

const POWER_DOWN_ORDER: [&str; 5] = [
    "stop_advertising",
    "transport_shutdown",
    "sensor_power_down",
    "flush_output",
    "deep_sleep",
];

#[test]
fn idle_disconnected_warns_once_then_hibernates() {
    let mut rig = Rig::new();
    rig.step();

    rig.run_for(TIMEOUT_MS - LEAD_MS - TICK_MS);
    assert_eq!(rig.engine.idle_phase(), IdlePhase::Active);
    assert_eq!(rig.engine.stats().warnings_issued, 0);

    rig.tick();
    assert_eq!(rig.engine.idle_phase(), IdlePhase::WarningIssued);
    assert_eq!(rig.engine.stats().warnings_issued, 1);

    rig.run_for(LEAD_MS - 2 * TICK_MS);
    assert_eq!(rig.engine.stats().warnings_issued, 1);
    assert!(!rig.engine.is_hibernating());

    assert_eq!(rig.tick(), EngineStatus::Running);
    assert_eq!(rig.tick(), EngineStatus::Hibernating);
    assert_eq!(rig.now_ms(), TIMEOUT_MS);
    assert_eq!(rig.engine.idle_phase(), IdlePhase::Hibernating);
    assert!(rig.slept.get());
}

#[test]
fn command_after_warning_cancels_hibernation() {
    let mut rig = Rig::new();
    rig.step();
    rig.run_for(TIMEOUT_MS - LEAD_MS);
    assert_eq!(rig.engine.stats().warnings_issued, 1);

    rig.link.connect();
    rig.write(&[0x6F]);
    rig.tick();
    assert_eq!(rig.engine.idle_phase(), IdlePhase::Active);
    rig.link.disconnect();
    rig.tick();
    let reset_at = rig.now_ms();

    // Well past the original deadline, still short of the new one.
    rig.run_for(TIMEOUT_MS - TICK_MS);
    assert!(!rig.engine.is_hibernating());
    assert!(!rig.slept.get());
    assert_eq!(rig.engine.stats().warnings_issued, 2);

    assert_eq!(rig.tick(), EngineStatus::Hibernating);
    assert_eq!(rig.now_ms() - reset_at, TIMEOUT_MS);
}

#[test]
fn never_hibernates_while_connected() {
    let mut rig = Rig::new();
    rig.connect();
    rig.run_for(TIMEOUT_MS * 5);
    assert!(!rig.engine.is_hibernating());
    assert_eq!(rig.engine.stats().warnings_issued, 0);
    assert!(rig.journal.entries().is_empty());
}

#[test]
fn idle_clock_starts_at_disconnect() {
    let mut rig = Rig::new();
    rig.connect();
    rig.run_for(TIMEOUT_MS * 3);
    rig.link.disconnect();
    rig.tick();
    let lost_at = rig.now_ms();

    assert_eq!(rig.run_for(TIMEOUT_MS), EngineStatus::Hibernating);
    assert_eq!(rig.now_ms() - lost_at, TIMEOUT_MS);
}

#[test]
fn shutdown_opcode_runs_power_down_in_order() {
    let mut rig = Rig::new();
    rig.connect();
    rig.write(&[0x65]);
    rig.step();
    rig.link.take_sent();

    rig.write(&[0x6E]);
    assert_eq!(rig.tick(), EngineStatus::Hibernating);
    assert_eq!(rig.journal.entries(), POWER_DOWN_ORDER);
    assert!(!rig.engine.state().measurement_active);
    assert!(rig.link.take_sent().is_empty(), "no sample after shutdown");
    assert!(!rig.link.is_advertising());
    assert!(rig.link.is_shut_down());
    assert!(rig.load.is_powered_down());
    assert!(rig.engine.power_down_report().is_some_and(|r| r.clean()));
}

#[test]
fn hibernation_is_terminal() {
    let mut rig = Rig::new();
    rig.connect();
    rig.write(&[0x6E]);
    rig.step();
    let polls = rig.link.polls();

    rig.link.connect();
    rig.write(&[0x65]);
    for _ in 0..20 {
        assert_eq!(rig.tick(), EngineStatus::Hibernating);
    }
    assert_eq!(rig.link.polls(), polls);
    assert_eq!(rig.journal.entries().len(), POWER_DOWN_ORDER.len());
}

#[test]
fn failing_steps_do_not_block_deep_sleep() {
    let mut rig = Rig::new();
    rig.link.inject(LinkFault::StopAdvertising);
    rig.link.inject(LinkFault::Shutdown);
    rig.load.fail_power_down(true);
    rig.connect();
    rig.write(&[0x6E]);
    rig.step();

    assert!(rig.slept.get());
    assert_eq!(rig.journal.entries(), POWER_DOWN_ORDER);
    let report = rig.engine.power_down_report().expect("report");
    assert!(!report.advertising_stopped);
    assert!(!report.transport_shut_down);
    assert!(!report.sensor_powered_down);
    assert!(report.output_flushed);
    assert!(!report.clean());
}

#[test]
fn sample_sent_counts_as_activity() {
    let mut rig = Rig::new();
    rig.connect();
    rig.write(&[0x65]);
    rig.step();
    rig.run_for(TIMEOUT_MS * 2);
    let last_sample_at = rig.engine.state().last_sample_sent_ms;
    assert_eq!(last_sample_at, Some(rig.now_ms()));
    assert_eq!(rig.engine.state().idle_since_ms, rig.now_ms());
}
