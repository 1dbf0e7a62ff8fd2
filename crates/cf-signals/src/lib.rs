//! cf-signals: reference signal generation.
//!
//! Generators are stateful lazy sequences: [`Generator::next`] samples the
//! waveform at the internal time and advances it by one period, while
//! [`Generator::value_at`] is a pure evaluation used by tests and by the
//! mixer. A vertical offset is applied additively to every variant and can
//! be rewritten live; the runtime uses it to carry the setpoint.

pub mod error;
pub mod generator;
pub mod switch;

pub use error::{SignalError, SignalResult};
pub use generator::{Generator, PwmSignal, RampSignal, SignalMixer, SineSignal, StepSignal};
pub use switch::{SignalKind, SignalSwitch};
