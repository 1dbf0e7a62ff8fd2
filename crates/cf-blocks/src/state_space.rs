//! Discrete state-space system.

use cf_core::config::SAMPLE_HISTORY_CAPACITY;

use crate::block::{check_sampling_period, Block, SampleHistory, SampledSystem};
use crate::error::{BlockError, BlockResult};

/// Single-input single-output discrete state-space system:
///
/// ```text
/// y[k]   = C*x[k] + D*u[k]
/// x[k+1] = A*x[k] + B*u[k]
/// ```
///
/// Construction validates that `A` is square `n x n` with `n > 0` and that
/// `B` and `C` have length `n`. The state vector starts at zero.
#[derive(Debug, Clone)]
pub struct StateSpace {
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: f64,
    x: Vec<f64>,
    ts: f64,
    k: u64,
    history: SampleHistory,
}

impl StateSpace {
    /// Create a state-space system from its matrices.
    ///
    /// # Errors
    ///
    /// Rejects an empty or non-square `A`, `B`/`C` length mismatches and
    /// `ts <= 0`.
    pub fn new(
        a: Vec<Vec<f64>>,
        b: Vec<f64>,
        c: Vec<f64>,
        d: f64,
        ts: f64,
    ) -> BlockResult<Self> {
        check_sampling_period(ts)?;
        if a.is_empty() {
            return Err(BlockError::DimensionMismatch {
                what: "A must not be empty",
            });
        }
        let n = a.len();
        if a.iter().any(|row| row.len() != n) {
            return Err(BlockError::DimensionMismatch {
                what: "A must be square (n x n)",
            });
        }
        if b.len() != n {
            return Err(BlockError::DimensionMismatch {
                what: "B must have length n",
            });
        }
        if c.len() != n {
            return Err(BlockError::DimensionMismatch {
                what: "C must have length n",
            });
        }
        Ok(Self {
            a,
            b,
            c,
            d,
            x: vec![0.0; n],
            ts,
            k: 0,
            history: SampleHistory::new(SAMPLE_HISTORY_CAPACITY),
        })
    }

    /// State dimension `n`.
    pub fn order(&self) -> usize {
        self.x.len()
    }

    /// Current state vector `x[k]`.
    pub fn state(&self) -> &[f64] {
        &self.x
    }

    /// Diagnostic sample history.
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }
}

impl SampledSystem for StateSpace {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn reset(&mut self) {
        self.x.fill(0.0);
        self.k = 0;
        self.history.clear();
    }
}

impl Block for StateSpace {
    fn step(&mut self, u: f64) -> f64 {
        let n = self.x.len();

        // y[k] = C*x + D*u
        let mut y = self.d * u;
        for i in 0..n {
            y += self.c[i] * self.x[i];
        }

        // x[k+1] = A*x + B*u
        let mut x_next = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                x_next[i] += self.a[i][j] * self.x[j];
            }
            x_next[i] += self.b[i] * u;
        }
        self.x = x_next;

        self.history.record(self.k, u, y);
        self.k += 1;
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dimension_mismatch() {
        assert!(StateSpace::new(vec![], vec![], vec![], 0.0, 0.001).is_err());
        // Non-square A.
        assert!(StateSpace::new(
            vec![vec![1.0, 0.0], vec![0.0]],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            0.0,
            0.001
        )
        .is_err());
        // B of wrong length.
        assert!(StateSpace::new(
            vec![vec![1.0]],
            vec![1.0, 2.0],
            vec![1.0],
            0.0,
            0.001
        )
        .is_err());
    }

    #[test]
    fn direct_feedthrough() {
        // A = 0, B = 0, C = 0, D = 2 -> y = 2u.
        let mut ss =
            StateSpace::new(vec![vec![0.0]], vec![0.0], vec![0.0], 2.0, 0.001).unwrap();
        assert_eq!(ss.step(1.5), 3.0);
    }

    #[test]
    fn scalar_integrator() {
        // x+ = x + u, y = x: discrete accumulator with one step of delay.
        let mut ss =
            StateSpace::new(vec![vec![1.0]], vec![1.0], vec![1.0], 0.0, 0.001).unwrap();
        assert_eq!(ss.step(1.0), 0.0);
        assert_eq!(ss.step(1.0), 1.0);
        assert_eq!(ss.step(1.0), 2.0);
        assert_eq!(ss.state(), &[3.0]);
    }

    #[test]
    fn reset_zeroes_state() {
        let mut ss =
            StateSpace::new(vec![vec![1.0]], vec![1.0], vec![1.0], 0.0, 0.001).unwrap();
        ss.step(4.0);
        ss.reset();
        assert_eq!(ss.state(), &[0.0]);
        assert_eq!(ss.step(0.0), 0.0);
    }

    #[test]
    fn second_order_matches_hand_computation() {
        let mut ss = StateSpace::new(
            vec![vec![0.5, 0.1], vec![0.0, 0.9]],
            vec![1.0, 0.5],
            vec![1.0, 0.0],
            0.0,
            0.01,
        )
        .unwrap();
        // k=0: y = x1 = 0; x -> [1.0, 0.5]
        assert_eq!(ss.step(1.0), 0.0);
        // k=1: y = 1.0; x -> [0.5+0.05, 0.45] = [0.55, 0.45]
        assert!((ss.step(0.0) - 1.0).abs() < 1e-12);
        assert!((ss.state()[0] - 0.55).abs() < 1e-12);
        assert!((ss.state()[1] - 0.45).abs() < 1e-12);
    }
}
