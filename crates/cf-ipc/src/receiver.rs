//! Parameter receiver endpoint.

use cf_runtime::{ControlParameters, SharedCell};

use crate::error::IpcResult;
use crate::messages::ParamsMessage;
use crate::queue::{MessageQueue, PARAMS_QUEUE};

/// Polls the parameter queue and applies updates to the parameter cell.
pub struct Receiver {
    queue: MessageQueue,
    params: SharedCell<ControlParameters>,
}

impl Receiver {
    /// Open the parameter queue as a receiver.
    pub fn new(params: SharedCell<ControlParameters>) -> IpcResult<Self> {
        let queue = MessageQueue::open_receiver(PARAMS_QUEUE)?;
        Ok(Self { queue, params })
    }

    /// Poll once. On a message, write all parameter fields into the cell
    /// under its mutex and return the message. An empty queue returns
    /// `Ok(None)`; a malformed message is an error for this poll only.
    pub fn poll(&self) -> IpcResult<Option<ParamsMessage>> {
        let mut buf = [0u8; 64];
        let Some(len) = self.queue.try_receive(&mut buf)? else {
            return Ok(None);
        };
        let msg = ParamsMessage::from_bytes(&buf[..len])?;
        {
            let mut params = self.params.lock();
            params.kp = msg.kp;
            params.ki = msg.ki;
            params.kd = msg.kd;
            params.setpoint = msg.setpoint;
            params.signal_type = msg.signal_type;
        }
        Ok(Some(msg))
    }
}
