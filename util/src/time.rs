//! General time utility functions

use std::time::{Duration, Instant};

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// A source of time which can also block the caller.
///
/// All control loops measure time and wait through a `Clock` so that they can be driven by a
/// simulated clock in tests and in the simulator.
pub trait Clock {
    /// Seconds elapsed since the clock was created.
    fn elapsed_s(&self) -> f64;

    /// Block for the given number of seconds. Non-positive durations return immediately.
    fn sleep_s(&mut self, duration_s: f64);
}

/// Wall clock, blocks the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn sleep_s(&mut self, duration_s: f64) {
        if duration_s > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(duration_s));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }

    #[test]
    fn test_system_clock_sleeps() {
        let mut clock = SystemClock::new();
        clock.sleep_s(0.01);
        clock.sleep_s(-1.0);
        assert!(clock.elapsed_s() >= 0.01);
    }
}
