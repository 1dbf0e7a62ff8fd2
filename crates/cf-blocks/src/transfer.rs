//! Discrete transfer function evaluated as a difference equation.

use cf_core::config::SAMPLE_HISTORY_CAPACITY;

use crate::block::{check_sampling_period, Block, SampleHistory, SampledSystem};
use crate::error::{BlockError, BlockResult};

/// Discrete transfer function `B(z^-1)/A(z^-1)` in difference-equation form:
///
/// ```text
/// y[k] = b[0]*u[k] + ... + b[m]*u[k-m] - a[1]*y[k-1] - ... - a[n]*y[k-n]
/// ```
///
/// The denominator is normalised at construction so that `a[0] = 1` (the
/// numerator is scaled by the same factor, preserving the transfer
/// function). The input history has length `|b|`, the output history length
/// `|a| - 1`, both zero-filled at construction.
#[derive(Debug, Clone)]
pub struct TransferFunction {
    b: Vec<f64>,
    a: Vec<f64>,
    u_hist: Vec<f64>,
    y_hist: Vec<f64>,
    ts: f64,
    k: u64,
    history: SampleHistory,
}

impl TransferFunction {
    /// Create a transfer function from numerator `b` and denominator `a`
    /// coefficients in ascending powers of `z^-1`.
    ///
    /// # Errors
    ///
    /// Rejects an empty numerator or denominator, a zero/non-finite leading
    /// denominator coefficient, non-finite coefficients and `ts <= 0`.
    pub fn new(b: Vec<f64>, a: Vec<f64>, ts: f64) -> BlockResult<Self> {
        check_sampling_period(ts)?;
        if b.is_empty() {
            return Err(BlockError::InvalidArg {
                what: "numerator must not be empty",
            });
        }
        if a.is_empty() {
            return Err(BlockError::InvalidArg {
                what: "denominator must not be empty",
            });
        }
        if b.iter().chain(a.iter()).any(|c| !c.is_finite()) {
            return Err(BlockError::InvalidArg {
                what: "coefficients must be finite",
            });
        }
        let a0 = a[0];
        if a0 == 0.0 {
            return Err(BlockError::InvalidArg {
                what: "leading denominator coefficient must be non-zero",
            });
        }

        // Normalise so a[0] = 1; both polynomials scale by the same factor.
        let b: Vec<f64> = b.into_iter().map(|c| c / a0).collect();
        let a: Vec<f64> = a.into_iter().map(|c| c / a0).collect();

        let u_hist = vec![0.0; b.len()];
        let y_hist = vec![0.0; a.len() - 1];
        Ok(Self {
            b,
            a,
            u_hist,
            y_hist,
            ts,
            k: 0,
            history: SampleHistory::new(SAMPLE_HISTORY_CAPACITY),
        })
    }

    /// Normalised numerator coefficients.
    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    /// Normalised denominator coefficients (`a[0] = 1`).
    pub fn denominator(&self) -> &[f64] {
        &self.a
    }

    /// Diagnostic sample history.
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }
}

impl SampledSystem for TransferFunction {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn reset(&mut self) {
        self.u_hist.fill(0.0);
        self.y_hist.fill(0.0);
        self.k = 0;
        self.history.clear();
    }
}

impl Block for TransferFunction {
    fn step(&mut self, u: f64) -> f64 {
        // Shift the input history and insert u[k] at the front.
        self.u_hist.rotate_right(1);
        self.u_hist[0] = u;

        // Numerator contribution.
        let mut y = 0.0;
        for (bi, ui) in self.b.iter().zip(self.u_hist.iter()) {
            y += bi * ui;
        }
        // Output feedback; a[0] = 1 by construction.
        for (ai, yi) in self.a[1..].iter().zip(self.y_hist.iter()) {
            y -= ai * yi;
        }

        if !self.y_hist.is_empty() {
            self.y_hist.rotate_right(1);
            self.y_hist[0] = y;
        }
        self.history.record(self.k, u, y);
        self.k += 1;
        y
    }
}
