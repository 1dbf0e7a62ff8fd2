//! Central configuration constants - single source of truth.
//!
//! Every rate, buffer size and timeout used by the simulator is defined here
//! so that the loop wiring, the loggers and the tests all agree on the same
//! numbers.

/// Sampling period of the PID controller task (seconds).
pub const TS_CONTROLLER: f64 = 0.01; // 10 ms = 100 Hz

/// Sampling period of the component tasks (seconds).
pub const TS_COMPONENT: f64 = TS_CONTROLLER / 10.0; // 1 ms = 1000 Hz

/// PID controller task frequency (Hz).
pub const FREQ_CONTROLLER: f64 = 1.0 / TS_CONTROLLER;

/// Component task frequency (Hz).
pub const FREQ_COMPONENT: f64 = 1.0 / TS_COMPONENT;

/// IPC transmitter/receiver frequency (Hz).
pub const FREQ_COMMUNICATION: f64 = 10.0;

/// Run/stop monitor polling frequency (Hz).
pub const FREQ_MONITOR: f64 = 10.0;

/// Capacity of the per-block diagnostic sample history.
pub const SAMPLE_HISTORY_CAPACITY: usize = 100;

/// Capacity of the runtime logger's circular line buffer.
pub const LOGGER_CAPACITY: usize = 1000;

/// Lines between automatic runtime-logger flushes.
pub const LOGGER_FLUSH_INTERVAL: usize = 100;

/// Directory where per-task runtime logs are written.
pub const LOG_DIRECTORY: &str = "logs";

/// Bounded-wait lock timeout as a fraction of the task period.
pub const TIMED_LOCK_FRACTION: f64 = 0.2;

/// Period-usage fraction above which a cycle is classified WARNING.
pub const WARNING_THRESHOLD: f64 = 0.9;

/// Period-usage fraction above which a cycle is classified CRITICAL.
pub const CRITICAL_THRESHOLD: f64 = 1.0;

/// Default proportional gain seeded into the parameter cell.
pub const KP_DEFAULT: f64 = 1.0;

/// Default integral gain seeded into the parameter cell.
pub const KI_DEFAULT: f64 = 0.5;

/// Default derivative gain seeded into the parameter cell.
pub const KD_DEFAULT: f64 = 0.2;

/// Default setpoint seeded into the parameter cell.
pub const SETPOINT_DEFAULT: f64 = 0.0;
