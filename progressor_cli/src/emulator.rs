//! Config mapping, collaborator assembly, and the emulator commands.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use progressor_config::{Config, SensorBackend, SimMode};
use progressor_core::{Engine, EngineCfg, RunOutcome};
use progressor_hardware::{FixedBattery, SimulatedLoadCell, SimulatedPower, SimulatedTransport};
use progressor_traits::{Clock, LoadCell, MonotonicClock};
use serde_json::json;

use crate::cli::DEFAULT_CONFIG;
use crate::console::{ConsoleTransport, HostPower};
use crate::error_fmt::CliError;

/// Read and validate the config. Only the default path may be absent.
pub fn load_config(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        if path == Path::new(DEFAULT_CONFIG) {
            return Ok(Config::default());
        }
        return Err(CliError::MissingConfig(path.to_path_buf()).into());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = progressor_config::load_toml(&text)
        .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
    cfg.validate()
        .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
    Ok(cfg)
}

/// Pick the load cell backend described by `[sensor]`. A profile replays on `clock`.
pub fn make_load_cell(
    cfg: &Config,
    profile: Option<&Path>,
    clock: Arc<dyn Clock + Send + Sync>,
) -> eyre::Result<Box<dyn LoadCell>> {
    let sensor = &cfg.sensor;
    match sensor.backend {
        SensorBackend::Sim => {
            let csv = profile
                .map(Path::to_path_buf)
                .or_else(|| sensor.profile_csv.as_ref().map(Into::into));
            if let Some(path) = csv {
                let rows = progressor_config::load_weight_profile_csv(&path)?;
                tracing::info!(path = %path.display(), points = rows.len(), "weight profile loaded");
                let points = rows.iter().map(|r| (r.t_ms, r.kg)).collect();
                return Ok(Box::new(SimulatedLoadCell::profile(points, clock)));
            }
            let cell: Box<dyn LoadCell> = match sensor.sim_mode {
                SimMode::Sweep => Box::new(SimulatedLoadCell::sweep()),
                SimMode::Constant => Box::new(SimulatedLoadCell::constant(sensor.sim_constant_kg)),
            };
            Ok(cell)
        }
        SensorBackend::Hx711 => open_hx711(cfg),
    }
}

#[cfg(feature = "hardware")]
fn open_hx711(cfg: &Config) -> eyre::Result<Box<dyn LoadCell>> {
    let s = &cfg.sensor;
    let (Some(dt), Some(sck)) = (s.pins.dt, s.pins.sck) else {
        return Err(CliError::InvalidConfig("sensor.pins.dt and sensor.pins.sck are required (pin missing)".into()).into());
    };
    let cell = progressor_hardware::hx711::Hx711LoadCell::open(
        dt,
        sck,
        s.kg_per_count,
        std::time::Duration::from_millis(s.read_timeout_ms),
    )
    .wrap_err("open hx711")?;
    Ok(Box::new(cell))
}

#[cfg(not(feature = "hardware"))]
fn open_hx711(_cfg: &Config) -> eyre::Result<Box<dyn LoadCell>> {
    eyre::bail!("the hx711 backend requires the `hardware` feature")
}

/// Run the emulator on the console link until hibernation, quit, or Ctrl-C.
pub fn run(
    cfg: &Config,
    json: bool,
    max_steps: Option<u64>,
    profile: Option<&Path>,
) -> eyre::Result<RunOutcome> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let cell = make_load_cell(cfg, profile, clock.clone())?;
    let core_cfg: EngineCfg = cfg.into();
    let tick = core_cfg.tick.0;

    let mut engine = Engine::builder()
        .with_transport(ConsoleTransport::stdio(json, shutdown.clone()))
        .with_boxed_load_cell(cell)
        .with_battery(FixedBattery(cfg.battery.millivolts))
        .with_power(HostPower)
        .with_clock(clock)
        .with_config(core_cfg)
        .build()?;

    tracing::info!(
        device = %engine.device().name,
        sample_interval_ms = engine.sample_interval_ms(),
        hibernation_timeout_ms = cfg.hibernation.timeout_ms,
        "advertising"
    );
    let outcome = progressor_core::run(&mut engine, tick, &shutdown, max_steps)?;
    let stats = engine.stats();
    tracing::info!(
        ?outcome,
        steps = stats.steps,
        commands = stats.commands,
        samples_sent = stats.samples_sent,
        notify_failures = stats.notify_failures,
        "emulator finished"
    );
    Ok(outcome)
}

/// Build the engine from config against in-memory collaborators and read the sensor once.
pub fn self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let cell = make_load_cell(cfg, None, clock.clone())?;
    let mut engine = Engine::builder()
        .with_transport(SimulatedTransport::new())
        .with_boxed_load_cell(cell)
        .with_battery(FixedBattery(cfg.battery.millivolts))
        .with_power(SimulatedPower::new())
        .with_clock(clock)
        .with_config(cfg.into())
        .build()?;
    let kg = engine.probe_weight_kg();
    if json {
        println!("{}", json!({ "status": "ok", "weight_kg": kg }));
    } else {
        println!("ok");
    }
    Ok(())
}

pub fn health_json(cfg: &Config) -> serde_json::Value {
    json!({
        "status": "ok",
        "device": cfg.device.name,
        "version": format!("{}.{}", cfg.device.version_major, cfg.device.version_minor),
        "sample_interval_ms": cfg.stream.sample_interval_ms,
        "hibernation_timeout_ms": cfg.hibernation.timeout_ms,
        "sensor_backend": match cfg.sensor.backend {
            SensorBackend::Sim => "sim",
            SensorBackend::Hx711 => "hx711",
        },
    })
}
