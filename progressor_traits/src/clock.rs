use std::time::{Duration, Instant};

/// Time source for the engine.
///
/// All protocol timing (sample pacing, session timestamps, idle periods) is
/// measured with `ms_since` against an epoch taken from the same clock, and
/// the runner paces ticks with `sleep`.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Whole milliseconds from `epoch` to now; 0 if `epoch` lies ahead.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let elapsed = self.now().checked_duration_since(epoch).unwrap_or_default();
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-clock time from `Instant::now`, sleeping the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{Duration, Instant};

    use super::Clock;

    /// Clock that stands still until a test (or the runner's `sleep`) moves it.
    ///
    /// Elapsed time is kept in microseconds behind an `Arc`, so every clone
    /// observes the same timeline.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        origin: Instant,
        elapsed_us: Arc<AtomicU64>,
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                elapsed_us: Arc::new(AtomicU64::new(0)),
            }
        }

        pub fn advance(&self, d: Duration) {
            let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
            // The closure always returns Some, so this cannot fail.
            let _ = self
                .elapsed_us
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                    Some(cur.saturating_add(us))
                });
        }

        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }

        /// Total time advanced so far.
        pub fn elapsed(&self) -> Duration {
            Duration::from_micros(self.elapsed_us.load(Ordering::Relaxed))
        }

        pub fn elapsed_ms(&self) -> u64 {
            self.elapsed_us.load(Ordering::Relaxed) / 1_000
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

}
