//! Engine status returned from each loop step.

/// Public status of a single engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Keep stepping.
    Running,
    /// Power-down ran; the engine is terminal until an external reset.
    Hibernating,
}
