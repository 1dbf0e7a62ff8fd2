//! Reference signal switch.
//!
//! Owns the three switchable generators and delegates each sample to the
//! selected one. The selector is the external `signal_type` encoding:
//! `0 = step, 1 = PWM, 2 = sine`.

use serde::{Deserialize, Serialize};

use crate::error::{SignalError, SignalResult};
use crate::generator::{Generator, PwmSignal, SineSignal, StepSignal};

/// Selectable reference waveform. The discriminants are the wire encoding
/// used in parameter messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SignalKind {
    Step = 0,
    Pwm = 1,
    Sine = 2,
}

impl SignalKind {
    /// Wire encoding of this kind.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SignalKind {
    type Error = SignalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Step),
            1 => Ok(Self::Pwm),
            2 => Ok(Self::Sine),
            _ => Err(SignalError::SelectorOutOfRange { value }),
        }
    }
}

/// Multiplexer over the three reference generators.
///
/// Each generator keeps its own internal time; only the selected one
/// advances when [`SignalSwitch::next`] is called. The vertical offset of
/// the selected generator carries the live setpoint.
pub struct SignalSwitch {
    step: StepSignal,
    pwm: PwmSignal,
    sine: SineSignal,
    selector: SignalKind,
}

impl SignalSwitch {
    /// Create a switch over the three generators with an initial selector.
    pub fn new(
        step: StepSignal,
        pwm: PwmSignal,
        sine: SineSignal,
        selector: SignalKind,
    ) -> Self {
        Self {
            step,
            pwm,
            sine,
            selector,
        }
    }

    /// The current selector.
    pub fn selector(&self) -> SignalKind {
        self.selector
    }

    /// Select the generator to sample from.
    pub fn set_selector(&mut self, kind: SignalKind) {
        self.selector = kind;
    }

    /// Select from the wire encoding; rejects values outside `0..=2`.
    pub fn try_select(&mut self, raw: u8) -> SignalResult<()> {
        self.selector = SignalKind::try_from(raw)?;
        Ok(())
    }

    /// Write the setpoint into the selected generator's vertical offset.
    pub fn set_offset(&mut self, offset: f64) {
        self.selected_mut().set_offset(offset);
    }

    /// Sample the selected generator and advance its internal time.
    pub fn next(&mut self) -> f64 {
        self.selected_mut().next()
    }

    /// Evaluate the selected generator at its current internal time.
    pub fn value(&self) -> f64 {
        let g = self.selected();
        g.value_at(g.elapsed())
    }

    /// Rewind all three generators.
    pub fn reset(&mut self) {
        self.step.reset();
        self.pwm.reset();
        self.sine.reset();
    }

    fn selected(&self) -> &dyn Generator {
        match self.selector {
            SignalKind::Step => &self.step,
            SignalKind::Pwm => &self.pwm,
            SignalKind::Sine => &self.sine,
        }
    }

    fn selected_mut(&mut self) -> &mut dyn Generator {
        match self.selector {
            SignalKind::Step => &mut self.step,
            SignalKind::Pwm => &mut self.pwm,
            SignalKind::Sine => &mut self.sine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: f64 = 0.001;

    fn switch() -> SignalSwitch {
        SignalSwitch::new(
            StepSignal::new(TS, 1.0, 0.0, 0.0).unwrap(),
            PwmSignal::new(TS, 1.0, 0.5, 0.01, 0.0).unwrap(),
            SineSignal::new(TS, 1.0, 1.0, 0.0, 0.0).unwrap(),
            SignalKind::Step,
        )
    }

    #[test]
    fn kind_round_trips_through_wire_encoding() {
        for kind in [SignalKind::Step, SignalKind::Pwm, SignalKind::Sine] {
            assert_eq!(SignalKind::try_from(kind.as_u8()).unwrap(), kind);
        }
    }

    #[test]
    fn rejects_out_of_range_selector() {
        let mut sw = switch();
        assert_eq!(
            sw.try_select(3),
            Err(SignalError::SelectorOutOfRange { value: 3 })
        );
        // Failed selection leaves the previous selector in place.
        assert_eq!(sw.selector(), SignalKind::Step);
    }

    #[test]
    fn delegates_to_selected_generator() {
        let mut sw = switch();
        assert_eq!(sw.next(), 1.0); // step, amplitude 1 from t = 0

        sw.set_selector(SignalKind::Sine);
        // Sine was never sampled, so its time base starts at zero.
        assert!((sw.next() - 0.0).abs() < 1e-12);
        assert!(sw.next() > 0.0);
    }

    #[test]
    fn only_selected_generator_advances() {
        let mut sw = switch();
        sw.next();
        sw.next();
        sw.set_selector(SignalKind::Sine);
        // Two step samples must not have advanced the sine's time base.
        assert!((sw.next() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn offset_applies_to_selected_generator() {
        let mut sw = switch();
        sw.set_selector(SignalKind::Sine);
        sw.set_offset(2.5);
        assert!((sw.next() - 2.5).abs() < 1e-12); // sin(0) + 2.5
    }
}
