//! Tustin (bilinear) discretisation of continuous transfer functions.
//!
//! Substitutes `s = (2/Ts) * (1 - z^-1) / (1 + z^-1)` into `B(s)/A(s)` and
//! clears denominators with `(1 + z^-1)^n`, yielding polynomial coefficients
//! in ascending powers of `z^-1` with the leading denominator coefficient
//! normalised to 1.

use serde::{Deserialize, Serialize};

use crate::error::{BlockError, BlockResult};

/// Coefficients of a discretised transfer function in `z^-1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteTf {
    /// Numerator coefficients, ascending powers of `z^-1`.
    pub b: Vec<f64>,
    /// Denominator coefficients, ascending powers of `z^-1`, `a[0] = 1`.
    pub a: Vec<f64>,
}

/// Discretise `B(s)/A(s)` with the Tustin transform at period `ts`.
///
/// `num_s` and `den_s` are coefficients in descending powers of `s`. The
/// numerator order must not exceed the denominator order (proper transfer
/// function).
///
/// # Errors
///
/// Rejects `ts <= 0`, an empty or leading-zero denominator, and improper
/// transfer functions.
pub fn tustin(num_s: &[f64], den_s: &[f64], ts: f64) -> BlockResult<DiscreteTf> {
    if !(ts > 0.0) {
        return Err(BlockError::InvalidArg {
            what: "discretisation period Ts must be positive",
        });
    }
    if num_s.is_empty() {
        return Err(BlockError::InvalidArg {
            what: "continuous numerator must not be empty",
        });
    }
    if den_s.is_empty() || den_s[0].abs() < 1e-12 {
        return Err(BlockError::InvalidArg {
            what: "continuous denominator must have a non-zero leading coefficient",
        });
    }
    if num_s.len() > den_s.len() {
        return Err(BlockError::InvalidArg {
            what: "transfer function must be proper (deg B <= deg A)",
        });
    }

    let n = den_s.len() - 1;
    let b = bilinear_poly(num_s, ts, n);
    let mut a = bilinear_poly(den_s, ts, n);

    // Normalise so a[0] = 1.
    let a0 = a[0];
    let b: Vec<f64> = b.into_iter().map(|c| c / a0).collect();
    for c in &mut a {
        *c /= a0;
    }
    Ok(DiscreteTf { b, a })
}

/// Coefficients of `(1 + sign*x)^k`, ascending powers of `x`.
fn binomial_poly(k: usize, sign: i32) -> Vec<f64> {
    let mut c = vec![0.0; k + 1];
    c[0] = 1.0;
    for i in 1..=k {
        c[i] = c[i - 1] * (k - i + 1) as f64 / i as f64;
    }
    if sign < 0 {
        for (i, ci) in c.iter_mut().enumerate() {
            if i % 2 == 1 {
                *ci = -*ci;
            }
        }
    }
    c
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut r = vec![0.0; a.len() + b.len() - 1];
    for (i, ai) in a.iter().enumerate() {
        for (j, bj) in b.iter().enumerate() {
            r[i + j] += ai * bj;
        }
    }
    r
}

fn poly_add(a: &[f64], b: &[f64]) -> Vec<f64> {
    let n = a.len().max(b.len());
    (0..n)
        .map(|i| a.get(i).copied().unwrap_or(0.0) + b.get(i).copied().unwrap_or(0.0))
        .collect()
}

/// One transformed term: `c * (K*(1-x)/(1+x))^p * (1+x)^n`
/// = `c * K^p * (1-x)^p * (1+x)^(n-p)` with `x = z^-1`.
fn transform_term(c: f64, p: usize, k: f64, n: usize) -> Vec<f64> {
    let scale = c * k.powi(p as i32);
    let term = if p == 0 {
        binomial_poly(n, 1)
    } else {
        poly_mul(&binomial_poly(p, -1), &binomial_poly(n - p, 1))
    };
    term.into_iter().map(|v| v * scale).collect()
}

/// Apply the bilinear substitution to a polynomial in `s` (descending
/// coefficients) and clear denominators with `(1+x)^n`.
fn bilinear_poly(coeffs: &[f64], ts: f64, n: usize) -> Vec<f64> {
    let order = coeffs.len() - 1;
    let k = 2.0 / ts;
    let mut acc = vec![0.0];
    for (i, &c) in coeffs.iter().enumerate() {
        let p = order - i; // power of s carried by this coefficient
        acc = poly_add(&acc, &transform_term(c, p, k, n));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_inputs() {
        assert!(tustin(&[1.0], &[1.0, 1.0], 0.0).is_err());
        assert!(tustin(&[], &[1.0, 1.0], 0.01).is_err());
        assert!(tustin(&[1.0], &[], 0.01).is_err());
        assert!(tustin(&[1.0], &[0.0, 1.0], 0.01).is_err());
        assert!(tustin(&[1.0, 1.0, 1.0], &[1.0, 1.0], 0.01).is_err());
    }

    #[test]
    fn first_order_lag_closed_form() {
        // 1/(s+1) under Tustin:
        //   b = [Ts, Ts] / (Ts + 2),  a = [1, (Ts - 2)/(Ts + 2)]
        let ts = 0.001;
        let dtf = tustin(&[1.0], &[1.0, 1.0], ts).unwrap();
        let scale = ts + 2.0;
        assert_eq!(dtf.b.len(), 2);
        assert_eq!(dtf.a.len(), 2);
        assert!((dtf.b[0] - ts / scale).abs() < 1e-15);
        assert!((dtf.b[1] - ts / scale).abs() < 1e-15);
        assert!((dtf.a[0] - 1.0).abs() < 1e-15);
        assert!((dtf.a[1] - (ts - 2.0) / scale).abs() < 1e-15);
    }

    #[test]
    fn dc_gain_is_preserved() {
        // At z = 1 (s = 0) the discrete gain equals the continuous DC gain.
        let dtf = tustin(&[3.0], &[0.5, 1.5], 0.01).unwrap();
        let num: f64 = dtf.b.iter().sum();
        let den: f64 = dtf.a.iter().sum();
        assert!((num / den - 2.0).abs() < 1e-10);
    }

    /// Tustin maps the continuous response at the pre-warped frequency
    /// `wp = (2/T) * tan(w*T/2)` exactly onto the discrete response at `w`.
    #[test]
    fn frequency_response_matches_prewarped_continuous() {
        let ts = 0.001;
        let dtf = tustin(&[1.0], &[1.0, 1.0], ts).unwrap();

        for &w in &[1.0, 10.0, 100.0, 500.0] {
            // Discrete response at z = e^{j w Ts}.
            let (mut num_re, mut num_im) = (0.0, 0.0);
            let (mut den_re, mut den_im) = (0.0, 0.0);
            for (i, &bi) in dtf.b.iter().enumerate() {
                let phi = -(i as f64) * w * ts;
                num_re += bi * phi.cos();
                num_im += bi * phi.sin();
            }
            for (i, &ai) in dtf.a.iter().enumerate() {
                let phi = -(i as f64) * w * ts;
                den_re += ai * phi.cos();
                den_im += ai * phi.sin();
            }
            let mag_d = (num_re * num_re + num_im * num_im).sqrt()
                / (den_re * den_re + den_im * den_im).sqrt();

            // Continuous response |1/(jwp + 1)| at the pre-warped frequency.
            let wp = (2.0 / ts) * (w * ts / 2.0).tan();
            let mag_c = 1.0 / (1.0 + wp * wp).sqrt();

            assert!(
                (mag_d - mag_c).abs() < 1e-9,
                "w={w}: discrete {mag_d} vs prewarped continuous {mag_c}"
            );
        }
    }

    #[test]
    fn second_order_orders() {
        let dtf = tustin(&[1.0], &[1.0, 1.4, 1.0], 0.01).unwrap();
        assert_eq!(dtf.b.len(), 3);
        assert_eq!(dtf.a.len(), 3);
        assert!((dtf.a[0] - 1.0).abs() < 1e-15);
    }
}
