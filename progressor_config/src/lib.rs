#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and weight-profile parsing for the Progressor emulator.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional; an empty file yields the defaults.
//! - The weight-profile CSV loader enforces headers and time ordering.
use serde::Deserialize;

/// Longest advertised name that fits the device-info name field (16 bytes, NUL-terminated).
pub const MAX_DEVICE_NAME_LEN: usize = 15;

/// Weight profile CSV schema.
///
/// Expected headers:
/// t_ms,kg
///
/// Example:
/// t_ms,kg
/// 0,0.0
/// 500,12.5
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ProfileRow {
    pub t_ms: u64,
    pub kg: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    pub name: String,
    pub version_major: u8,
    pub version_minor: u8,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            name: "Progressor".to_string(),
            version_major: 1,
            version_minor: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StreamCfg {
    /// Minimum spacing between weight notifications while measuring.
    pub sample_interval_ms: u64,
}

impl Default for StreamCfg {
    fn default() -> Self {
        Self {
            sample_interval_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    /// Cadence of the cooperative engine loop.
    pub tick_ms: u64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self { tick_ms: 10 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HibernationCfg {
    /// Disconnected idle time before power-down.
    pub timeout_ms: u64,
    /// How long before `timeout_ms` the one-shot warning fires.
    pub warning_lead_ms: u64,
}

impl Default for HibernationCfg {
    fn default() -> Self {
        Self {
            timeout_ms: 300_000,
            warning_lead_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    #[default]
    Sim,
    Hx711,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimMode {
    #[default]
    Sweep,
    Constant,
}

#[derive(Debug, Deserialize, Default)]
pub struct Pins {
    pub dt: Option<u8>,
    pub sck: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    pub backend: SensorBackend,
    /// Conversions averaged per reported sample.
    pub samples_per_read: u8,
    /// Upper bound on one data-ready wait (ms).
    pub read_timeout_ms: u64,
    pub sim_mode: SimMode,
    pub sim_constant_kg: f32,
    /// Optional CSV (`t_ms,kg`) replayed by the simulated load cell; overrides `sim_mode`.
    pub profile_csv: Option<String>,
    /// HX711 scale factor.
    pub kg_per_count: f32,
    pub pins: Pins,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            backend: SensorBackend::Sim,
            samples_per_read: 1,
            read_timeout_ms: 20,
            sim_mode: SimMode::Sweep,
            sim_constant_kg: 0.0,
            profile_csv: None,
            kg_per_count: 1.0e-5,
            pins: Pins::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BatteryCfg {
    pub millivolts: u32,
}

impl Default for BatteryCfg {
    fn default() -> Self {
        Self { millivolts: 3700 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceCfg,
    pub stream: StreamCfg,
    pub engine: EngineCfg,
    pub hibernation: HibernationCfg,
    pub sensor: SensorCfg,
    pub battery: BatteryCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_weight_profile_csv(path: &std::path::Path) -> eyre::Result<Vec<ProfileRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open weight profile CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["t_ms", "kg"];
    let actual: Vec<String> = headers.iter().map(ToString::to_string).collect();
    if actual != expected {
        eyre::bail!(
            "weight profile CSV must have headers 't_ms,kg', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<ProfileRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ProfileRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        if !row.kg.is_finite() {
            eyre::bail!("invalid CSV row {}: kg must be finite", idx + 2);
        }
        if let Some(prev) = rows.last()
            && row.t_ms < prev.t_ms
        {
            eyre::bail!(
                "invalid CSV row {}: t_ms {} goes backwards (previous {})",
                idx + 2,
                row.t_ms,
                prev.t_ms
            );
        }
        rows.push(row);
    }

    if rows.is_empty() {
        eyre::bail!("weight profile CSV {:?} has no rows", path);
    }
    Ok(rows)
}

/// Longest a single averaged sensor read may block the engine step.
pub const MAX_SENSOR_READ_BUDGET_MS: u64 = 250;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.name.is_empty() {
            eyre::bail!("device.name must not be empty");
        }
        if self.device.name.contains('\0') {
            eyre::bail!("device.name must not contain NUL");
        }

        // Stream
        if self.stream.sample_interval_ms == 0 {
            eyre::bail!("stream.sample_interval_ms must be >= 1");
        }

        // Engine
        if !(1..=1000).contains(&self.engine.tick_ms) {
            eyre::bail!("engine.tick_ms must be in [1, 1000]");
        }

        // Hibernation
        if self.hibernation.timeout_ms == 0 {
            eyre::bail!("hibernation.timeout_ms must be >= 1");
        }
        if self.hibernation.warning_lead_ms >= self.hibernation.timeout_ms {
            eyre::bail!("hibernation.warning_lead_ms must be < hibernation.timeout_ms");
        }

        // Sensor
        if !(1..=64).contains(&self.sensor.samples_per_read) {
            eyre::bail!("sensor.samples_per_read must be in [1, 64]");
        }
        if !(1..=1000).contains(&self.sensor.read_timeout_ms) {
            eyre::bail!("sensor.read_timeout_ms must be in [1, 1000]");
        }
        let worst_read_ms = u64::from(self.sensor.samples_per_read) * self.sensor.read_timeout_ms;
        if worst_read_ms > MAX_SENSOR_READ_BUDGET_MS {
            eyre::bail!(
                "sensor.samples_per_read * sensor.read_timeout_ms is {worst_read_ms} ms; must be <= {MAX_SENSOR_READ_BUDGET_MS} ms"
            );
        }
        if !self.sensor.sim_constant_kg.is_finite() {
            eyre::bail!("sensor.sim_constant_kg must be finite");
        }
        if !self.sensor.kg_per_count.is_finite() || self.sensor.kg_per_count == 0.0 {
            eyre::bail!("sensor.kg_per_count must be finite and non-zero");
        }
        if self.sensor.backend == SensorBackend::Hx711
            && (self.sensor.pins.dt.is_none() || self.sensor.pins.sck.is_none())
        {
            eyre::bail!("sensor.pins.dt and sensor.pins.sck are required for the hx711 backend (pin missing)");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {r:?}");
        }

        Ok(())
    }
}
