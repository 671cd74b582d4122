//! Common time helpers for progressor_core.

/// Number of microseconds in one millisecond.
pub const MICROS_PER_MILLI: u64 = 1_000;

/// Session-relative timestamp for the wire: elapsed ms scaled to µs,
/// saturating at `u32::MAX` instead of wrapping (about 71.6 minutes).
#[inline]
pub fn session_timestamp_us(now_ms: u64, session_start_ms: u64) -> u32 {
    let elapsed_us = now_ms
        .saturating_sub(session_start_ms)
        .saturating_mul(MICROS_PER_MILLI);
    u32::try_from(elapsed_us).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::session_timestamp_us;

    #[test]
    fn scales_and_saturates() {
        assert_eq!(session_timestamp_us(0, 0), 0);
        assert_eq!(session_timestamp_us(150, 100), 50_000);
        // Clock behind the session start never underflows.
        assert_eq!(session_timestamp_us(10, 100), 0);
        assert_eq!(session_timestamp_us(u64::MAX, 0), u32::MAX);
        assert_eq!(session_timestamp_us(4_294_968, 0), u32::MAX);
        assert_eq!(session_timestamp_us(4_294_967, 0), 4_294_967_000);
    }
}
