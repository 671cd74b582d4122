#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Progressor protocol engine (hardware-agnostic).
//!
//! Emulates the peripheral side of a Progressor-style force gauge. All
//! hardware goes through the `progressor_traits` boundary: `Transport`,
//! `LoadCell`, `BatteryMonitor`, `PowerControl`, and `Clock`.
//!
//! ## Architecture
//!
//! - **Codec**: command decoding and `[kind, len, payload]` response frames (`codec`)
//! - **Dispatcher**: opcode handling for the control point (`dispatcher`)
//! - **Scheduler**: rate-limited weight streaming while measuring (`scheduler`)
//! - **Idle monitor**: warning and hibernation while disconnected (`idle`)
//! - **Power**: the best-effort, ordered power-down sequence (`power`)
//! - **Engine**: one cooperative `step()` tying the above together (`engine`)
//!
//! The engine is single-threaded. Each component receives `&mut EngineState`
//! in turn, so a tick's command handling, sample emission, and idle check
//! never interleave. Hibernation is terminal: once `step()` returns
//! `EngineStatus::Hibernating` it keeps returning it.

pub mod builder;
pub mod codec;
pub mod config;
pub mod conversions;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod hw_error;
pub mod idle;
pub mod power;
pub mod runner;
pub mod scheduler;
pub mod sensor;
pub mod state;
pub mod status;
pub mod util;

pub use builder::EngineBuilder;
pub use codec::{
    CONTROL_POINT_UUID, CommandFrame, DATA_POINT_UUID, Opcode, Response, ResponseFrame,
    ResponseKind, SERVICE_UUID, decode_command, decode_response,
};
pub use config::{DeviceInfo, EngineCfg, IdleCfg, SensorCfg, StreamCfg, Tick};
pub use dispatcher::{Dispatch, Dispatcher};
pub use engine::{Engine, EngineStats};
pub use error::{BuildError, CodecError, EngineError, Result};
pub use idle::{IdleEvent, IdlePhase};
pub use power::PowerDownReport;
pub use runner::{RunOutcome, run};
pub use scheduler::MeasurementSample;
pub use state::EngineState;
pub use status::EngineStatus;
