//! Time utilities for the match simulation

use std::time::{Duration, Instant};

/// Simulation tick period
pub const DEFAULT_TICK_RATE_MS: u64 = 100;

/// Presenter cadence for the headless driver
pub const DEFAULT_FRAME_RATE_MS: u64 = 1000;

/// Time between `start` and `now`, zero if `now` is earlier
pub fn elapsed(start: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(start)
}

/// Elapsed minutes as a float, for words-per-minute
pub fn elapsed_minutes(start: Instant, now: Instant) -> f64 {
    elapsed(start, now).as_secs_f64() / 60.0
}

/// Whole elapsed seconds
pub fn elapsed_secs(start: Instant, now: Instant) -> u64 {
    elapsed(start, now).as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates() {
        let start = Instant::now();
        let later = start + Duration::from_secs(90);
        assert_eq!(elapsed_secs(start, later), 90);
        assert!((elapsed_minutes(start, later) - 1.5).abs() < 1e-9);
        assert_eq!(elapsed(later, start), Duration::ZERO);
    }
}
