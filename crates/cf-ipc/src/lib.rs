//! cf-ipc: message-queue communication with the GUI process.
//!
//! Two named POSIX queues connect the simulator to an external GUI:
//! - `/mq_params_to_proc` carries [`ParamsMessage`] (gains, setpoint,
//!   signal type) into the simulator
//! - `/mq_data_to_gui` carries [`DataMessage`] telemetry out
//!
//! Messages use a fixed little-endian layout with no implicit padding; the
//! byte layout is the external contract. Telemetry is best-effort: a full
//! queue drops the sample, a missing parameter message is not an error.

pub mod error;
pub mod messages;
pub mod queue;
pub mod receiver;
pub mod tasks;
pub mod transmitter;

pub use error::{IpcError, IpcResult};
pub use messages::{DataMessage, ParamsMessage, DATA_MESSAGE_SIZE, PARAMS_MESSAGE_SIZE};
pub use queue::{MessageQueue, QueueConfig, DATA_QUEUE, PARAMS_QUEUE};
pub use receiver::Receiver;
pub use tasks::{ReceiverTask, TransmitterTask};
pub use transmitter::Transmitter;
