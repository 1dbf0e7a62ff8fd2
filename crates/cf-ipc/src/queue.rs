//! POSIX message-queue transport.

use std::ffi::CString;

use nix::errno::Errno;
use nix::mqueue::{mq_close, mq_open, mq_receive, mq_send, mq_unlink, MQ_OFlag, MqAttr, MqdT};
use nix::sys::stat::Mode;

use crate::error::{IpcError, IpcResult};

/// Static description of one named queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// POSIX queue name (global, starts with `/`).
    pub name: &'static str,
    /// Maximum queued messages.
    pub capacity: i64,
    /// Maximum message size in bytes.
    pub msg_size: i64,
    /// Priority used for sends on this queue.
    pub priority: u32,
}

/// Telemetry queue towards the GUI: low priority, best effort.
pub const DATA_QUEUE: QueueConfig = QueueConfig {
    name: "/mq_data_to_gui",
    capacity: 10,
    msg_size: 64,
    priority: 0,
};

/// Parameter queue from the GUI: small, high priority.
pub const PARAMS_QUEUE: QueueConfig = QueueConfig {
    name: "/mq_params_to_proc",
    capacity: 5,
    msg_size: 64,
    priority: 10,
};

/// An open message queue endpoint.
///
/// Both directions are non-blocking: sending into a full queue and reading
/// from an empty one are per-period events, not stalls.
pub struct MessageQueue {
    mqd: Option<MqdT>,
    config: QueueConfig,
}

impl MessageQueue {
    /// Open (creating if needed) the queue for sending.
    pub fn open_sender(config: QueueConfig) -> IpcResult<Self> {
        Self::open(config, MQ_OFlag::O_CREAT | MQ_OFlag::O_WRONLY | MQ_OFlag::O_NONBLOCK)
    }

    /// Open (creating if needed) the queue for receiving.
    pub fn open_receiver(config: QueueConfig) -> IpcResult<Self> {
        Self::open(config, MQ_OFlag::O_CREAT | MQ_OFlag::O_RDONLY | MQ_OFlag::O_NONBLOCK)
    }

    fn open(config: QueueConfig, flags: MQ_OFlag) -> IpcResult<Self> {
        let name = queue_name(config.name);
        let attr = MqAttr::new(0, config.capacity, config.msg_size, 0);
        let mqd = mq_open(
            name.as_c_str(),
            flags,
            Mode::from_bits_truncate(0o644),
            Some(&attr),
        )
        .map_err(|source| IpcError::QueueOpen {
            name: config.name,
            source,
        })?;
        Ok(Self {
            mqd: Some(mqd),
            config,
        })
    }

    /// The queue's static configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Send one message at the queue's configured priority.
    ///
    /// # Errors
    ///
    /// [`IpcError::QueueFull`] when the queue is at capacity, otherwise
    /// [`IpcError::Transfer`].
    pub fn send(&self, payload: &[u8]) -> IpcResult<()> {
        let mqd = self.mqd.as_ref().expect("queue open");
        match mq_send(mqd, payload, self.config.priority) {
            Ok(()) => Ok(()),
            Err(Errno::EAGAIN) => Err(IpcError::QueueFull {
                name: self.config.name,
            }),
            Err(source) => Err(IpcError::Transfer {
                name: self.config.name,
                source,
            }),
        }
    }

    /// Receive one message if available.
    ///
    /// Returns `Ok(None)` when the queue is empty; `buf` must be at least
    /// `msg_size` bytes.
    pub fn try_receive(&self, buf: &mut [u8]) -> IpcResult<Option<usize>> {
        let mqd = self.mqd.as_ref().expect("queue open");
        let mut priority = 0u32;
        match mq_receive(mqd, buf, &mut priority) {
            Ok(len) => Ok(Some(len)),
            Err(Errno::EAGAIN) => Ok(None),
            Err(source) => Err(IpcError::Transfer {
                name: self.config.name,
                source,
            }),
        }
    }

    /// Remove the queue name from the system. Existing descriptors stay
    /// usable until closed; call this once at orderly shutdown.
    pub fn unlink(config: QueueConfig) -> IpcResult<()> {
        match mq_unlink(queue_name(config.name).as_c_str()) {
            Ok(()) | Err(Errno::ENOENT) => Ok(()),
            Err(source) => Err(IpcError::Transfer {
                name: config.name,
                source,
            }),
        }
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        if let Some(mqd) = self.mqd.take() {
            if let Err(e) = mq_close(mqd) {
                log::warn!("mq_close({}) failed: {e}", self.config.name);
            }
        }
    }
}

fn queue_name(name: &str) -> CString {
    CString::new(name).expect("queue names contain no NUL")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Message queues may be unavailable in sandboxed environments; skip
    /// rather than fail when the transport cannot be created at all.
    fn open_pair(config: QueueConfig) -> Option<(MessageQueue, MessageQueue)> {
        let rx = match MessageQueue::open_receiver(config) {
            Ok(rx) => rx,
            Err(e) => {
                eprintln!("skipping mq test: {e}");
                return None;
            }
        };
        let tx = MessageQueue::open_sender(config).ok()?;
        Some((tx, rx))
    }

    const TEST_QUEUE: QueueConfig = QueueConfig {
        name: "/cf_ipc_test_queue",
        capacity: 4,
        msg_size: 64,
        priority: 1,
    };

    #[test]
    fn loopback_and_backpressure() {
        let Some((tx, rx)) = open_pair(TEST_QUEUE) else {
            return;
        };

        // Drain anything a previous aborted run may have left queued.
        let mut buf = [0u8; 64];
        while rx.try_receive(&mut buf).unwrap().is_some() {}
        assert!(rx.try_receive(&mut buf).unwrap().is_none());

        // Round-trip a payload.
        tx.send(b"hello").unwrap();
        let len = rx.try_receive(&mut buf).unwrap().unwrap();
        assert_eq!(&buf[..len], b"hello");

        // Fill to capacity: the next send reports QueueFull.
        for _ in 0..TEST_QUEUE.capacity {
            tx.send(b"x").unwrap();
        }
        match tx.send(b"overflow") {
            Err(IpcError::QueueFull { .. }) => {}
            other => panic!("expected QueueFull, got {other:?}"),
        }

        drop((tx, rx));
        MessageQueue::unlink(TEST_QUEUE).unwrap();
    }
}
