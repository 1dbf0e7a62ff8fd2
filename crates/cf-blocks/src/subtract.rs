//! Summing junction: error computation `e = r - y`.

use cf_core::config::SAMPLE_HISTORY_CAPACITY;

use crate::block::{check_sampling_period, SampleHistory, SampledSystem, TwoInputBlock};
use crate::error::BlockResult;

/// Comparator block, `e[k] = r[k] - y[k]`.
///
/// Only implements [`TwoInputBlock`]; there is no one-input entry point.
#[derive(Debug, Clone)]
pub struct Subtract {
    ts: f64,
    e_out: f64,
    k: u64,
    history: SampleHistory,
}

impl Subtract {
    /// Create a summing junction with sampling period `ts` (seconds).
    pub fn new(ts: f64) -> BlockResult<Self> {
        check_sampling_period(ts)?;
        Ok(Self {
            ts,
            e_out: 0.0,
            k: 0,
            history: SampleHistory::new(SAMPLE_HISTORY_CAPACITY),
        })
    }

    /// The most recent error value.
    pub fn last_output(&self) -> f64 {
        self.e_out
    }

    /// Diagnostic sample history (records the reference input).
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }
}

impl SampledSystem for Subtract {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn reset(&mut self) {
        self.e_out = 0.0;
        self.k = 0;
        self.history.clear();
    }
}

impl TwoInputBlock for Subtract {
    fn step2(&mut self, r: f64, y: f64) -> f64 {
        self.e_out = r - y;
        self.history.record(self.k, r, self.e_out);
        self.k += 1;
        self.e_out
    }
}
