//! cf-runtime: the periodic-task runtime.
//!
//! Executes heterogeneous discrete blocks as independent cooperating OS
//! threads:
//! - shared cells ([`PipelineSignals`], [`ControlParameters`]) guarded by
//!   one mutex each; a task never holds two cell mutexes at once
//! - a shared atomic [`RunFlag`] for cooperative cancellation
//! - drift-free pacing via [`cf_core::AbsoluteTimer`]
//! - per-task [`RuntimeLogger`] files with timing instrumentation
//! - a run/stop [`MonitorTask`] and a process-global signal flag

pub mod cells;
pub mod error;
pub mod logger;
pub mod monitor;
pub mod pid_task;
pub mod signal_flag;
pub mod status;
pub mod switch_task;
pub mod task;

pub use cells::{shared, ControlParameters, PipelineSignals, RunFlag, SharedCell};
pub use error::{RuntimeError, RuntimeResult};
pub use logger::RuntimeLogger;
pub use monitor::{MonitorTask, RunSwitch, SharedSwitch};
pub use pid_task::PidTask;
pub use status::Status;
pub use switch_task::SignalSwitchTask;
pub use task::{PeriodicTask, Task, TwoInputTask};
