//! cf-sim library surface, shared by the binary and the integration tests.

pub mod assembly;
pub mod error;

pub use assembly::{run, SimOptions, Simulator};
pub use error::{AppError, AppResult};
