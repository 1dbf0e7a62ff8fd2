//! Velocity-form discrete PID controller.

use cf_core::config::SAMPLE_HISTORY_CAPACITY;

use crate::block::{check_sampling_period, Block, SampleHistory, SampledSystem};
use crate::error::BlockResult;

/// Discrete PID controller in velocity (incremental) form:
///
/// ```text
/// du[k] = a0*e[k] + a1*e[k-1] + a2*e[k-2]
/// u[k]  = u[k-1] + du[k]
/// ```
///
/// with
///
/// ```text
/// a0 =  Kp + Ki*Ts + Kd/Ts
/// a1 = -Kp - 2*Kd/Ts
/// a2 =  Kd/Ts
/// ```
///
/// The velocity form integrates increments instead of keeping an explicit
/// integral accumulator, so gains can be retuned mid-run without an output
/// bump from a stale integral term. Gains are applied between steps by the
/// executing task; the coefficients are recomputed from the current gains
/// on every step.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    ts: f64,
    /// e[k-1]
    e1: f64,
    /// e[k-2]
    e2: f64,
    /// u[k-1]
    u_prev: f64,
    k: u64,
    history: SampleHistory,
}

impl Pid {
    /// Create a PID controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    /// * `kd` - Derivative gain
    /// * `ts` - Sampling period in seconds (must be positive)
    pub fn new(kp: f64, ki: f64, kd: f64, ts: f64) -> BlockResult<Self> {
        check_sampling_period(ts)?;
        Ok(Self {
            kp,
            ki,
            kd,
            ts,
            e1: 0.0,
            e2: 0.0,
            u_prev: 0.0,
            k: 0,
            history: SampleHistory::new(SAMPLE_HISTORY_CAPACITY),
        })
    }

    /// Current proportional gain.
    pub fn kp(&self) -> f64 {
        self.kp
    }

    /// Current integral gain.
    pub fn ki(&self) -> f64 {
        self.ki
    }

    /// Current derivative gain.
    pub fn kd(&self) -> f64 {
        self.kd
    }

    /// The last control action computed, `u[k-1]`.
    pub fn last_control(&self) -> f64 {
        self.u_prev
    }

    /// Update the proportional gain; takes effect on the next step.
    pub fn set_kp(&mut self, kp: f64) {
        self.kp = kp;
    }

    /// Update the integral gain; takes effect on the next step.
    pub fn set_ki(&mut self, ki: f64) {
        self.ki = ki;
    }

    /// Update the derivative gain; takes effect on the next step.
    pub fn set_kd(&mut self, kd: f64) {
        self.kd = kd;
    }

    /// Update all three gains at once; takes effect on the next step.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Diagnostic sample history (error in, control out).
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }
}

impl SampledSystem for Pid {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn reset(&mut self) {
        self.e1 = 0.0;
        self.e2 = 0.0;
        self.u_prev = 0.0;
        self.k = 0;
        self.history.clear();
    }
}

impl Block for Pid {
    fn step(&mut self, e: f64) -> f64 {
        let a0 = self.kp + self.ki * self.ts + self.kd / self.ts;
        let a1 = -self.kp - 2.0 * self.kd / self.ts;
        let a2 = self.kd / self.ts;

        let du = a0 * e + a1 * self.e1 + a2 * self.e2;
        let u = self.u_prev + du;

        self.e2 = self.e1;
        self.e1 = e;
        self.u_prev = u;

        self.history.record(self.k, e, u);
        self.k += 1;
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_sampling_period() {
        assert!(Pid::new(1.0, 0.0, 0.0, 0.0).is_err());
        assert!(Pid::new(1.0, 0.0, 0.0, -0.01).is_err());
    }

    #[test]
    fn pure_proportional_tracks_error() {
        let mut pid = Pid::new(2.0, 0.0, 0.0, 0.01).unwrap();
        // du = Kp*(e[k] - e[k-1]), u accumulates back to Kp*e[k].
        assert!((pid.step(1.0) - 2.0).abs() < 1e-12);
        assert!((pid.step(1.0) - 2.0).abs() < 1e-12);
        assert!((pid.step(0.5) - 1.0).abs() < 1e-12);
    }

    /// With Kd = 0 the controller is exactly the PI velocity recurrence.
    #[test]
    fn matches_pi_velocity_recurrence() {
        let (kp, ki, ts) = (1.3, 0.7, 0.01);
        let mut pid = Pid::new(kp, ki, 0.0, ts).unwrap();

        let errors = [1.0, 0.8, 0.5, -0.2, 0.0, 0.3, 0.9, -1.0];
        let mut u_ref = 0.0;
        let mut e_prev = 0.0;
        for &e in &errors {
            u_ref += kp * (e - e_prev) + ki * ts * e;
            e_prev = e;
            let u = pid.step(e);
            assert!((u - u_ref).abs() < 1e-10, "u={u} expected={u_ref}");
        }
    }

    #[test]
    fn derivative_term_uses_second_difference() {
        let (kd, ts) = (0.5, 0.01);
        let mut pid = Pid::new(0.0, 0.0, kd, ts).unwrap();
        // u[k] = u[k-1] + Kd/Ts * (e[k] - 2e[k-1] + e[k-2])
        let u0 = pid.step(1.0);
        assert!((u0 - kd / ts).abs() < 1e-9);
        let u1 = pid.step(1.0);
        // e - 2e1 + e2 = 1 - 2 + 0 = -1
        assert!((u1 - (u0 - kd / ts)).abs() < 1e-9);
    }

    #[test]
    fn retune_affects_only_subsequent_steps() {
        let mut pid = Pid::new(1.0, 0.0, 0.0, 0.01).unwrap();
        let u_before = pid.step(1.0);
        pid.set_gains(10.0, 0.0, 0.0);
        assert_eq!(pid.last_control(), u_before);
        // New Kp applies from this step on: du = 10*(1 - 1) = 0, then jump.
        let u_same_error = pid.step(1.0);
        assert!((u_same_error - u_before).abs() < 1e-12);
        let u_jump = pid.step(2.0);
        assert!((u_jump - (u_same_error + 10.0)).abs() < 1e-12);
    }

    #[test]
    fn reset_returns_to_initial_conditions() {
        let mut pid = Pid::new(1.0, 1.0, 0.1, 0.01).unwrap();
        pid.step(1.0);
        pid.step(-2.0);
        pid.reset();
        assert_eq!(pid.last_control(), 0.0);
        let mut fresh = Pid::new(1.0, 1.0, 0.1, 0.01).unwrap();
        assert_eq!(pid.step(0.4), fresh.step(0.4));
    }
}
