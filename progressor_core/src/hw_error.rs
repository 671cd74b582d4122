//! Maps `Box<dyn Error>` from trait boundaries to typed `EngineError`.
//!
//! The traits in `progressor_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `progressor_hardware::HwError` downcasting.

use crate::error::EngineError;

/// Map a trait-boundary error to a typed `EngineError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> EngineError {
    #[cfg(feature = "hardware-errors")]
    {
        use progressor_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout | HwError::DataReadyTimeout => EngineError::Timeout,
                HwError::NotConnected => EngineError::Transport(hw.to_string()),
                other => EngineError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        EngineError::Timeout
    } else {
        EngineError::Hardware(s)
    }
}

/// Convenience for the boxed errors every boundary trait returns.
pub fn map_boxed(e: &progressor_traits::BoxError) -> EngineError {
    map_hw_error(&**e)
}
