use thiserror::Error;

/// Collaborator failures, mapped from boundary errors by `hw_error`.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing transport")]
    MissingTransport,
    #[error("missing load cell")]
    MissingLoadCell,
    #[error("missing battery monitor")]
    MissingBattery,
    #[error("missing power control")]
    MissingPower,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Wire-level decoding failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed frame: empty command payload")]
    MalformedFrame,
    #[error("truncated frame: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("unknown response kind 0x{0:02X}")]
    UnknownKind(u8),
    #[error("length mismatch for kind 0x{kind:02X}: declared {declared}, expected {expected}")]
    LengthMismatch {
        kind: u8,
        declared: usize,
        expected: usize,
    },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
