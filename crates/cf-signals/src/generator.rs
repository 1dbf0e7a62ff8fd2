//! Waveform generators.

use std::f64::consts::TAU;

use crate::error::{SignalError, SignalResult};

fn check_sampling_period(ts: f64) -> SignalResult<()> {
    if ts > 0.0 && ts.is_finite() {
        Ok(())
    } else {
        Err(SignalError::InvalidArg {
            what: "sampling period Ts must be positive and finite",
        })
    }
}

/// A discrete signal source producing one scalar per step.
///
/// `value_at` is a pure evaluation of the waveform (offset included);
/// `next` samples at the internal time and advances it by `Ts`.
pub trait Generator: Send {
    /// Sampling period in seconds.
    fn sampling_period(&self) -> f64;

    /// Current vertical offset.
    fn offset(&self) -> f64;

    /// Replace the vertical offset; applies from the next sample.
    fn set_offset(&mut self, offset: f64);

    /// Internal time of the next sample.
    fn elapsed(&self) -> f64;

    /// Evaluate the signal at time `t` seconds without side effects.
    fn value_at(&self, t: f64) -> f64;

    /// Sample the signal at the internal time, then advance by one period.
    fn next(&mut self) -> f64;

    /// Rewind the internal time to zero.
    fn reset(&mut self);

    /// Evaluate the signal at sample index `k` (`t = k * Ts`) without side
    /// effects.
    fn value_at_sample(&self, k: usize) -> f64 {
        self.value_at(k as f64 * self.sampling_period())
    }
}

/// Delayed step: 0 before `step_time`, `amplitude` from `step_time` on.
#[derive(Debug, Clone)]
pub struct StepSignal {
    ts: f64,
    amplitude: f64,
    step_time: f64,
    offset: f64,
    t: f64,
}

impl StepSignal {
    pub fn new(ts: f64, amplitude: f64, step_time: f64, offset: f64) -> SignalResult<Self> {
        check_sampling_period(ts)?;
        if step_time < 0.0 {
            return Err(SignalError::InvalidArg {
                what: "step time must be non-negative",
            });
        }
        Ok(Self {
            ts,
            amplitude,
            step_time,
            offset,
            t: 0.0,
        })
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn step_time(&self) -> f64 {
        self.step_time
    }
}

impl Generator for StepSignal {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn offset(&self) -> f64 {
        self.offset
    }

    fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    fn elapsed(&self) -> f64 {
        self.t
    }

    fn value_at(&self, t: f64) -> f64 {
        let edge = if t >= self.step_time { self.amplitude } else { 0.0 };
        edge + self.offset
    }

    fn next(&mut self) -> f64 {
        let v = self.value_at(self.t);
        self.t += self.ts;
        v
    }

    fn reset(&mut self) {
        self.t = 0.0;
    }
}

/// Ramp: 0 before `start_time`, then rising with constant `slope`.
#[derive(Debug, Clone)]
pub struct RampSignal {
    ts: f64,
    slope: f64,
    start_time: f64,
    offset: f64,
    t: f64,
}

impl RampSignal {
    pub fn new(ts: f64, slope: f64, start_time: f64, offset: f64) -> SignalResult<Self> {
        check_sampling_period(ts)?;
        if start_time < 0.0 {
            return Err(SignalError::InvalidArg {
                what: "ramp start time must be non-negative",
            });
        }
        Ok(Self {
            ts,
            slope,
            start_time,
            offset,
            t: 0.0,
        })
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }
}

impl Generator for RampSignal {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn offset(&self) -> f64 {
        self.offset
    }

    fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    fn elapsed(&self) -> f64 {
        self.t
    }

    fn value_at(&self, t: f64) -> f64 {
        let ramp = if t >= self.start_time {
            self.slope * (t - self.start_time)
        } else {
            0.0
        };
        ramp + self.offset
    }

    fn next(&mut self) -> f64 {
        let v = self.value_at(self.t);
        self.t += self.ts;
        v
    }

    fn reset(&mut self) {
        self.t = 0.0;
    }
}

/// Sinusoid `amplitude * sin(2*pi*freq*t + phase)`.
#[derive(Debug, Clone)]
pub struct SineSignal {
    ts: f64,
    amplitude: f64,
    freq_hz: f64,
    phase: f64,
    offset: f64,
    t: f64,
}

impl SineSignal {
    pub fn new(
        ts: f64,
        amplitude: f64,
        freq_hz: f64,
        phase: f64,
        offset: f64,
    ) -> SignalResult<Self> {
        check_sampling_period(ts)?;
        if !(freq_hz > 0.0) {
            return Err(SignalError::InvalidArg {
                what: "sine frequency must be positive",
            });
        }
        Ok(Self {
            ts,
            amplitude,
            freq_hz,
            phase,
            offset,
            t: 0.0,
        })
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn frequency(&self) -> f64 {
        self.freq_hz
    }
}

impl Generator for SineSignal {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn offset(&self) -> f64 {
        self.offset
    }

    fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    fn elapsed(&self) -> f64 {
        self.t
    }

    fn value_at(&self, t: f64) -> f64 {
        self.amplitude * (TAU * self.freq_hz * t + self.phase).sin() + self.offset
    }

    fn next(&mut self) -> f64 {
        let v = self.value_at(self.t);
        self.t += self.ts;
        v
    }

    fn reset(&mut self) {
        self.t = 0.0;
    }
}

/// Square/PWM wave: `amplitude` for the first `duty` fraction of each
/// `period`, 0 for the rest.
#[derive(Debug, Clone)]
pub struct PwmSignal {
    ts: f64,
    amplitude: f64,
    duty: f64,
    period: f64,
    offset: f64,
    t: f64,
}

impl PwmSignal {
    pub fn new(
        ts: f64,
        amplitude: f64,
        duty: f64,
        period: f64,
        offset: f64,
    ) -> SignalResult<Self> {
        check_sampling_period(ts)?;
        if !(0.0..=1.0).contains(&duty) {
            return Err(SignalError::InvalidArg {
                what: "PWM duty cycle must be within [0, 1]",
            });
        }
        if !(period > 0.0) {
            return Err(SignalError::InvalidArg {
                what: "PWM period must be positive",
            });
        }
        Ok(Self {
            ts,
            amplitude,
            duty,
            period,
            offset,
            t: 0.0,
        })
    }

    pub fn duty(&self) -> f64 {
        self.duty
    }

    pub fn period(&self) -> f64 {
        self.period
    }
}

impl Generator for PwmSignal {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn offset(&self) -> f64 {
        self.offset
    }

    fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    fn elapsed(&self) -> f64 {
        self.t
    }

    fn value_at(&self, t: f64) -> f64 {
        let phase = (t / self.period).rem_euclid(1.0);
        let pulse = if phase < self.duty { self.amplitude } else { 0.0 };
        pulse + self.offset
    }

    fn next(&mut self) -> f64 {
        let v = self.value_at(self.t);
        self.t += self.ts;
        v
    }

    fn reset(&mut self) {
        self.t = 0.0;
    }
}

/// Weighted sum of child generators, evaluated at the mixer's own time.
///
/// Children are evaluated purely through [`Generator::value_at`]; only the
/// mixer's internal time advances on `next`.
pub struct SignalMixer {
    ts: f64,
    parts: Vec<(f64, Box<dyn Generator>)>,
    offset: f64,
    t: f64,
}

impl SignalMixer {
    pub fn new(ts: f64, parts: Vec<(f64, Box<dyn Generator>)>, offset: f64) -> SignalResult<Self> {
        check_sampling_period(ts)?;
        if parts.is_empty() {
            return Err(SignalError::InvalidArg {
                what: "mixer needs at least one component signal",
            });
        }
        Ok(Self {
            ts,
            parts,
            offset,
            t: 0.0,
        })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Generator for SignalMixer {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn offset(&self) -> f64 {
        self.offset
    }

    fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    fn elapsed(&self) -> f64 {
        self.t
    }

    fn value_at(&self, t: f64) -> f64 {
        let sum: f64 = self
            .parts
            .iter()
            .map(|(w, g)| w * g.value_at(t))
            .sum();
        sum + self.offset
    }

    fn next(&mut self) -> f64 {
        let v = self.value_at(self.t);
        self.t += self.ts;
        v
    }

    fn reset(&mut self) {
        self.t = 0.0;
        for (_, g) in &mut self.parts {
            g.reset();
        }
    }
}
