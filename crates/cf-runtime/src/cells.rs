//! Shared cells and the run/stop flag.
//!
//! All mutable state shared between tasks lives in exactly two records,
//! each behind its own mutex. Tasks hold cloned `Arc` handles; a task
//! acquires at most one cell mutex at a time and releases it before
//! touching the other, which rules out lock-ordering deadlock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use cf_core::config;

/// A record shared across tasks behind one mutex.
pub type SharedCell<T> = Arc<Mutex<T>>;

/// Wrap a record into a shared cell handle.
pub fn shared<T>(value: T) -> SharedCell<T> {
    Arc::new(Mutex::new(value))
}

/// The pipeline signal bundle: every scalar flowing around the loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineSignals {
    /// Reference produced by the signal switch.
    pub reference: f64,
    /// Error `reference - feedback` from the summing junction.
    pub error: f64,
    /// Digital control action from the PID.
    pub control: f64,
    /// Analog control action after the D/A hold.
    pub actuation: f64,
    /// Plant output (analog).
    pub plant_output: f64,
    /// Plant output after the A/D sampler, fed back to the junction.
    pub feedback: f64,
}

impl Default for PipelineSignals {
    fn default() -> Self {
        Self {
            reference: 0.0,
            error: 0.0,
            control: 0.0,
            actuation: 0.0,
            plant_output: 0.0,
            feedback: 0.0,
        }
    }
}

/// Live-tunable controller parameters, written by the IPC receiver and read
/// by the PID and signal-switch tasks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlParameters {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    /// Reference waveform selector: 0 = step, 1 = PWM, 2 = sine.
    pub signal_type: u8,
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            kp: config::KP_DEFAULT,
            ki: config::KI_DEFAULT,
            kd: config::KD_DEFAULT,
            setpoint: config::SETPOINT_DEFAULT,
            signal_type: 0,
        }
    }
}

/// Cooperative cancellation flag observed by every task once per period.
///
/// Atomic with release/acquire ordering: a `stop()` happens-before any
/// `is_running()` that observes it, so state written before the stop is
/// visible to the exiting tasks.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// Create a flag, initially running or stopped.
    pub fn new(running: bool) -> Self {
        Self(Arc::new(AtomicBool::new(running)))
    }

    /// True while the pipeline should keep running.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Command every task to stop at its next period boundary.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new(true)
    }
}
