//! Error type for simulator assembly.

/// Wraps construction-time errors from the backend crates; anything that
/// reaches `main` through this type is an initialisation failure (exit
/// code 1).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Block construction failed: {0}")]
    Block(#[from] cf_blocks::BlockError),

    #[error("Signal construction failed: {0}")]
    Signal(#[from] cf_signals::SignalError),

    #[error("Runtime setup failed: {0}")]
    Runtime(#[from] cf_runtime::RuntimeError),

    #[error("IPC setup failed: {0}")]
    Ipc(#[from] cf_ipc::IpcError),
}

/// Result type for simulator operations.
pub type AppResult<T> = Result<T, AppError>;
