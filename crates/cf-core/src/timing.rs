//! Drift-free absolute timing for periodic tasks.
//!
//! [`AbsoluteTimer`] sleeps until monotonic-clock deadlines `t0, t0+T,
//! t0+2T, ...` with `clock_nanosleep(TIMER_ABSTIME)`. Each deadline is
//! computed from the previous *planned* deadline, never from "now", so a
//! task that occasionally overruns does not accumulate timing error: the
//! next `wait()` simply returns immediately and the schedule re-converges.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::time::TimeSpec;
use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

use crate::error::{CoreError, CoreResult};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Periodic sleep primitive with absolute deadlines on `CLOCK_MONOTONIC`.
///
/// # Example
///
/// ```no_run
/// use cf_core::AbsoluteTimer;
///
/// let mut timer = AbsoluteTimer::new(100.0).unwrap(); // 100 Hz
/// for _ in 0..10 {
///     // ... periodic work ...
///     timer.wait().unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct AbsoluteTimer {
    /// Absolute instant of the next wake-up.
    next: TimeSpec,
    period_ns: i64,
}

impl AbsoluteTimer {
    /// Create a timer firing at `frequency_hz`, anchored at the current
    /// monotonic time.
    ///
    /// # Errors
    ///
    /// Returns an error if `frequency_hz` is not positive or the monotonic
    /// clock cannot be read.
    pub fn new(frequency_hz: f64) -> CoreResult<Self> {
        if !(frequency_hz > 0.0) {
            return Err(CoreError::InvalidArg {
                what: "timer frequency must be positive",
            });
        }
        let period_ns = (NANOS_PER_SEC as f64 / frequency_hz) as i64;
        let next = clock_gettime(ClockId::CLOCK_MONOTONIC)?;
        Ok(Self { next, period_ns })
    }

    /// Create a timer from a sampling period in seconds.
    pub fn from_period(ts: f64) -> CoreResult<Self> {
        if !(ts > 0.0) {
            return Err(CoreError::InvalidArg {
                what: "timer period must be positive",
            });
        }
        Self::new(1.0 / ts)
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(self.period_ns as u64)
    }

    /// Advance the deadline by one period and sleep until it.
    ///
    /// If the deadline is already in the past (the previous iteration
    /// overran), the call returns immediately. The sleep syscall's error is
    /// handed back to the caller; periodic tasks log it and continue.
    pub fn wait(&mut self) -> Result<(), Errno> {
        self.next = timespec_add_ns(self.next, self.period_ns);
        loop {
            match clock_nanosleep(
                ClockId::CLOCK_MONOTONIC,
                ClockNanosleepFlags::TIMER_ABSTIME,
                &self.next,
            ) {
                Ok(_) => return Ok(()),
                // Interrupted sleeps resume towards the same absolute deadline.
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Re-anchor the schedule to the current monotonic time.
    pub fn reset(&mut self) -> Result<(), Errno> {
        self.next = clock_gettime(ClockId::CLOCK_MONOTONIC)?;
        Ok(())
    }
}

/// Add nanoseconds to a `TimeSpec`, carrying into seconds.
fn timespec_add_ns(ts: TimeSpec, ns: i64) -> TimeSpec {
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= NANOS_PER_SEC {
        secs += 1;
        nanos -= NANOS_PER_SEC;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += NANOS_PER_SEC;
    }
    TimeSpec::new(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn rejects_non_positive_frequency() {
        assert!(AbsoluteTimer::new(0.0).is_err());
        assert!(AbsoluteTimer::new(-10.0).is_err());
        assert!(AbsoluteTimer::from_period(0.0).is_err());
    }

    #[test]
    fn period_from_frequency() {
        let timer = AbsoluteTimer::new(200.0).unwrap();
        assert_eq!(timer.period(), Duration::from_millis(5));
    }

    #[test]
    fn timespec_carry() {
        let ts = TimeSpec::new(1, 900_000_000);
        let sum = timespec_add_ns(ts, 200_000_000);
        assert_eq!(sum.tv_sec(), 2);
        assert_eq!(sum.tv_nsec(), 100_000_000);
    }

    /// N waits at frequency f elapse close to N/f, regardless of the work
    /// done per iteration (as long as it stays below the period).
    #[test]
    fn elapsed_time_tracks_schedule() {
        let n = 20;
        let mut timer = AbsoluteTimer::new(200.0).unwrap(); // 5 ms period
        let start = Instant::now();
        for _ in 0..n {
            // Work well under the period; the absolute schedule absorbs it.
            std::thread::sleep(Duration::from_millis(1));
            timer.wait().unwrap();
        }
        let elapsed = start.elapsed();
        // Expected 100 ms; allow wide scheduler jitter on loaded machines.
        assert!(elapsed >= Duration::from_millis(95), "elapsed {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(400), "elapsed {elapsed:?}");
    }

    #[test]
    fn overrun_does_not_stall() {
        let mut timer = AbsoluteTimer::new(100.0).unwrap(); // 10 ms period
        // Miss several deadlines outright.
        std::thread::sleep(Duration::from_millis(45));
        let start = Instant::now();
        timer.wait().unwrap();
        // Deadline already past: wait returns (almost) immediately.
        assert!(start.elapsed() < Duration::from_millis(10));
    }
}
