//! Error types for the periodic-task runtime.

use thiserror::Error;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur while assembling or tearing down tasks.
///
/// Per the propagation policy, only construction (thread spawn, timer
/// setup) surfaces errors; runtime faults are recorded in the per-task log
/// and never unwind the worker thread.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Invalid argument provided to a task constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The worker thread could not be created.
    #[error("Failed to spawn task thread '{name}': {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The worker thread panicked before it could be joined.
    #[error("Task thread '{name}' panicked")]
    ThreadPanicked { name: String },

    /// Timer construction failed.
    #[error(transparent)]
    Timer(#[from] cf_core::CoreError),

    /// Signal handler installation failed.
    #[error("Failed to install signal handlers: {0}")]
    SignalInstall(nix::errno::Errno),
}
