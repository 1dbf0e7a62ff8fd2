//! A/D converter: a sampler with a one-period delay.

use cf_core::config::SAMPLE_HISTORY_CAPACITY;

use crate::block::{check_sampling_period, Block, SampleHistory, SampledSystem};
use crate::error::BlockResult;

/// Ideal A/D converter, `y[k] = u[k-1]`.
///
/// Models the acquisition delay of a real sampler: the value presented at
/// the output is the one captured on the previous period. At `k = 0` the
/// output is 0.
#[derive(Debug, Clone)]
pub struct Delay {
    ts: f64,
    u_prev: f64,
    k: u64,
    history: SampleHistory,
}

impl Delay {
    /// Create a delay with sampling period `ts` (seconds).
    pub fn new(ts: f64) -> BlockResult<Self> {
        Self::with_history_capacity(ts, SAMPLE_HISTORY_CAPACITY)
    }

    /// Create a delay with an explicit diagnostic-history capacity.
    pub fn with_history_capacity(ts: f64, capacity: usize) -> BlockResult<Self> {
        check_sampling_period(ts)?;
        Ok(Self {
            ts,
            u_prev: 0.0,
            k: 0,
            history: SampleHistory::new(capacity),
        })
    }

    /// The input captured on the previous step, `u[k-1]`.
    pub fn last_input(&self) -> f64 {
        self.u_prev
    }

    /// Diagnostic sample history.
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }
}

impl SampledSystem for Delay {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn reset(&mut self) {
        self.u_prev = 0.0;
        self.k = 0;
        self.history.clear();
    }
}

impl Block for Delay {
    fn step(&mut self, u: f64) -> f64 {
        let y = self.u_prev;
        self.u_prev = u;
        self.history.record(self.k, u, y);
        self.k += 1;
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_previous_input() {
        let mut ad = Delay::new(0.001).unwrap();
        assert_eq!(ad.step(1.0), 0.0);
        assert_eq!(ad.step(2.0), 1.0);
        assert_eq!(ad.step(-0.5), 2.0);
        assert_eq!(ad.last_input(), -0.5);
    }

    #[test]
    fn reset_clears_state() {
        let mut ad = Delay::new(0.001).unwrap();
        ad.step(3.0);
        ad.reset();
        assert_eq!(ad.step(1.0), 0.0);
        assert_eq!(ad.history().len(), 1);
    }

    #[test]
    fn rejects_invalid_period() {
        assert!(Delay::new(0.0).is_err());
    }
}
