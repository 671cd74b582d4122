use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Block until the HX711 pulls DOUT low to signal a finished conversion.
///
/// `dout_high` samples the data line. Returns how long the conversion took to
/// become ready, or `DataReadyTimeout` once `budget` is spent.
pub fn wait_for_conversion(
    mut dout_high: impl FnMut() -> bool,
    budget: Duration,
    poll: Duration,
) -> Result<Duration> {
    let started = Instant::now();
    loop {
        if !dout_high() {
            return Ok(started.elapsed());
        }
        if started.elapsed() >= budget {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll);
    }
}

/// Sign-extend a 24-bit two's complement value held in the low bits of `raw`.
#[inline]
pub fn sign_extend_24(raw: u32) -> i32 {
    let v = (raw & 0x00FF_FFFF) as i32;
    if (v & 0x0080_0000) != 0 {
        v | !0x00FF_FFFF
    } else {
        v
    }
}
