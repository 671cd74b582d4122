use progressor_config::{SensorBackend, SimMode, load_toml};
use rstest::rstest;

#[test]
fn empty_file_yields_valid_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults should pass");
    assert_eq!(cfg.device.name, "Progressor");
    assert_eq!(cfg.stream.sample_interval_ms, 50);
    assert_eq!(cfg.engine.tick_ms, 10);
    assert_eq!(cfg.hibernation.timeout_ms, 300_000);
    assert_eq!(cfg.battery.millivolts, 3700);
    assert_eq!(cfg.sensor.backend, SensorBackend::Sim);
    assert_eq!(cfg.sensor.sim_mode, SimMode::Sweep);
}

#[test]
fn full_file_parses() {
    let toml = r#"
[device]
name = "Progressor-X"
version_major = 2
version_minor = 7

[stream]
sample_interval_ms = 100

[engine]
tick_ms = 5

[hibernation]
timeout_ms = 60000
warning_lead_ms = 5000

[sensor]
backend = "hx711"
samples_per_read = 4
read_timeout_ms = 50
kg_per_count = 0.00002

[sensor.pins]
dt = 5
sck = 6

[battery]
millivolts = 4100

[logging]
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.device.version_major, 2);
    assert_eq!(cfg.device.version_minor, 7);
    assert_eq!(cfg.sensor.backend, SensorBackend::Hx711);
    assert_eq!(cfg.sensor.pins.dt, Some(5));
}

#[rstest]
#[case("[stream]\nsample_interval_ms = 0\n", "stream.sample_interval_ms must be >= 1")]
#[case("[engine]\ntick_ms = 0\n", "engine.tick_ms")]
#[case("[hibernation]\ntimeout_ms = 1000\nwarning_lead_ms = 1000\n", "warning_lead_ms must be <")]
#[case("[hibernation]\ntimeout_ms = 0\nwarning_lead_ms = 0\n", "timeout_ms must be >= 1")]
#[case("[sensor]\nsamples_per_read = 0\n", "samples_per_read")]
#[case("[sensor]\nkg_per_count = 0.0\n", "kg_per_count")]
#[case("[sensor]\nsamples_per_read = 64\nread_timeout_ms = 1000\n", "must be <= 250 ms")]
#[case("[sensor]\nsamples_per_read = 26\nread_timeout_ms = 10\n", "is 260 ms")]
#[case("[sensor]\nbackend = \"hx711\"\n", "pin missing")]
#[case("[device]\nname = \"\"\n", "device.name must not be empty")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}");
}

#[test]
fn unknown_backend_is_a_parse_error() {
    assert!(load_toml("[sensor]\nbackend = \"strain\"\n").is_err());
}

#[test]
fn shipped_sample_config_is_valid() {
    let cfg = load_toml(include_str!("../../etc/progressor.toml")).expect("parse sample");
    cfg.validate().expect("sample config validates");
    assert_eq!(cfg.sensor.pins.dt, None);
}

#[test]
fn shipped_profile_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/pull_profile.csv");
    let rows = progressor_config::load_weight_profile_csv(&path).expect("profile");
    assert_eq!(rows.first().map(|r| r.t_ms), Some(0));
    assert!(rows.windows(2).all(|w| w[0].t_ms <= w[1].t_ms));
}

#[test]
fn read_budget_boundary_is_accepted() {
    let cfg = load_toml("[sensor]\nsamples_per_read = 25\nread_timeout_ms = 10\n").expect("parse");
    cfg.validate().expect("250 ms worst-case read is within budget");
}
