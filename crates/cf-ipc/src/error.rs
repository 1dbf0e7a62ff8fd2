//! Error types for IPC operations.

use nix::errno::Errno;
use thiserror::Error;

/// Result type for IPC operations.
pub type IpcResult<T> = Result<T, IpcError>;

/// Errors on the message-queue surface.
///
/// Queue creation failures are fatal (initialisation); send/receive
/// failures are transient and handled per period.
#[derive(Debug, Error)]
pub enum IpcError {
    /// Opening or configuring a queue failed.
    #[error("Failed to open message queue {name}: {source}")]
    QueueOpen {
        name: &'static str,
        #[source]
        source: Errno,
    },

    /// The queue was full on a non-blocking send.
    #[error("Message queue {name} is full")]
    QueueFull { name: &'static str },

    /// A send or receive failed for another reason.
    #[error("Message queue {name} transfer failed: {source}")]
    Transfer {
        name: &'static str,
        #[source]
        source: Errno,
    },

    /// An incoming message had the wrong size or content.
    #[error("Malformed message: {what} (got {got} bytes)")]
    Malformed { what: &'static str, got: usize },
}
