//! Scoped stopwatches
//!
//! `CumulativeTimer` sums the time spent in every timed section, so one timer
//! can follow all the I/O calls of a session.

use std::time::{Duration, Instant};

/// A stopwatch that accumulates across laps.
#[derive(Debug, Clone, Default)]
pub struct CumulativeTimer {
    total: Duration,
    laps: u64,
}

impl CumulativeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f`, adding its wall time to the total.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.total += start.elapsed();
        self.laps += 1;
        result
    }

    /// Total time over all laps.
    pub fn elapsed(&self) -> Duration {
        self.total
    }

    /// Number of timed sections.
    pub fn laps(&self) -> u64 {
        self.laps
    }
}

/// Time split between storage I/O and checksum folding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoTimings {
    pub io: Duration,
    pub checksum: Duration,
}

impl IoTimings {
    pub fn from_timers(io: &CumulativeTimer, checksum: &CumulativeTimer) -> Self {
        Self {
            io: io.elapsed(),
            checksum: checksum.elapsed(),
        }
    }
}

/// A simple duration timer for logging elapsed time
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_timer_accumulates() {
        let mut timer = CumulativeTimer::new();
        let value = timer.time(|| {
            std::thread::sleep(Duration::from_millis(5));
            42
        });
        timer.time(|| std::thread::sleep(Duration::from_millis(5)));

        assert_eq!(value, 42);
        assert_eq!(timer.laps(), 2);
        assert!(timer.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_new_timer_is_zero() {
        let timer = CumulativeTimer::new();
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert_eq!(timer.laps(), 0);
    }

    #[test]
    fn test_timer_elapsed_ms() {
        let timer = Timer::new();
        std::thread::sleep(Duration::from_millis(10));
        let ms: u64 = timer.elapsed_ms().parse().unwrap();
        assert!(ms >= 10);
    }
}
