//! D/A converter: zero-order hold.

use cf_core::config::SAMPLE_HISTORY_CAPACITY;

use crate::block::{check_sampling_period, Block, SampleHistory, SampledSystem};
use crate::error::BlockResult;

/// Ideal D/A converter, `y[k] = u[k]`.
///
/// The output is held constant for one sampling period (zero-order hold);
/// within the discrete pipeline that makes it a unity pass-through whose
/// held value is observable via [`Hold::last_output`].
#[derive(Debug, Clone)]
pub struct Hold {
    ts: f64,
    u_out: f64,
    k: u64,
    history: SampleHistory,
}

impl Hold {
    /// Create a hold with sampling period `ts` (seconds).
    pub fn new(ts: f64) -> BlockResult<Self> {
        check_sampling_period(ts)?;
        Ok(Self {
            ts,
            u_out: 0.0,
            k: 0,
            history: SampleHistory::new(SAMPLE_HISTORY_CAPACITY),
        })
    }

    /// The currently held output value.
    pub fn last_output(&self) -> f64 {
        self.u_out
    }

    /// Diagnostic sample history.
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }
}

impl SampledSystem for Hold {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn reset(&mut self) {
        self.u_out = 0.0;
        self.k = 0;
        self.history.clear();
    }
}

impl Block for Hold {
    fn step(&mut self, u: f64) -> f64 {
        self.u_out = u;
        self.history.record(self.k, u, u);
        self.k += 1;
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_with_held_value() {
        let mut da = Hold::new(0.001).unwrap();
        assert_eq!(da.step(0.7), 0.7);
        assert_eq!(da.last_output(), 0.7);
        assert_eq!(da.step(-2.0), -2.0);
        assert_eq!(da.last_output(), -2.0);
    }

    #[test]
    fn reset_zeroes_held_value() {
        let mut da = Hold::new(0.001).unwrap();
        da.step(5.0);
        da.reset();
        assert_eq!(da.last_output(), 0.0);
    }
}
