//! Mutable engine state shared by the dispatcher, scheduler, and idle monitor.
//!
//! Lives inside `Engine` and is handed by `&mut` to one component at a time,
//! so each tick's command handling, sample emission, and idle evaluation
//! never overlap.

/// All fields are milliseconds on the engine clock unless noted.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub measurement_active: bool,
    pub session_start_ms: u64,
    /// `None` forces the next scheduler tick to emit.
    pub last_sample_sent_ms: Option<u64>,
    /// Most recent accepted reading in kg; 0.0 until a non-zero read is seen.
    pub last_valid_weight: f32,
    /// Start of the current idle period.
    pub idle_since_ms: u64,
    pub hibernation_warning_issued: bool,
    /// Link state observed on the previous tick.
    pub connected: bool,
}

impl EngineState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            measurement_active: false,
            session_start_ms: now_ms,
            last_sample_sent_ms: None,
            last_valid_weight: 0.0,
            idle_since_ms: now_ms,
            hibernation_warning_issued: false,
            connected: false,
        }
    }

    /// Begin a fresh measurement session at `now_ms`.
    pub fn start_session(&mut self, now_ms: u64) {
        self.measurement_active = true;
        self.session_start_ms = now_ms;
        self.last_sample_sent_ms = None;
    }

    pub fn end_session(&mut self) {
        self.measurement_active = false;
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(0)
    }
}
