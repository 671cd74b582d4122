//! Collaborator boundaries consumed by the protocol engine.
//!
//! The engine never talks to a BLE stack, an ADC, or the platform directly;
//! everything goes through these traits so simulated and physical backends
//! are interchangeable.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

#[cfg(any(test, feature = "test-clock"))]
pub use clock::test_clock::ManualClock;

/// Boxed error type used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Load-cell driver: raw acquisition and zero reference.
pub trait LoadCell {
    /// True when a conversion is available without waiting.
    fn is_ready(&self) -> bool;
    /// Average `samples` conversions and return the calibrated weight in kg.
    fn read_raw(&mut self, samples: u8) -> Result<f32, BoxError>;
    /// Make the current load the zero reference for subsequent reads.
    fn tare_reference(&mut self) -> Result<(), BoxError>;
    fn power_down(&mut self) -> Result<(), BoxError>;
}

/// Notify/write GATT channel pair plus advertising control.
///
/// `poll()` pumps the underlying stack; writes to the control point are then
/// drained in arrival order with `take_write()`.
pub trait Transport {
    fn poll(&mut self);
    fn take_write(&mut self) -> Option<Vec<u8>>;
    fn send_notification(&mut self, payload: &[u8]) -> Result<(), BoxError>;
    fn is_connected(&self) -> bool;
    fn stop_advertising(&mut self) -> Result<(), BoxError>;
    fn shutdown(&mut self) -> Result<(), BoxError>;
}

pub trait BatteryMonitor {
    fn millivolts(&mut self) -> u32;
}

/// Platform power primitives.
pub trait PowerControl {
    /// Push out buffered console/log output before power is cut. Default: nothing buffered.
    fn flush_output(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    /// Enter deep sleep. On a device this does not return; callers treat it as terminal either way.
    fn enter_deep_sleep(&mut self);
}
