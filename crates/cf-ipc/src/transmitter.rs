//! Telemetry transmitter endpoint.

use std::time::Instant;

use cf_runtime::{PipelineSignals, SharedCell};

use crate::error::IpcResult;
use crate::messages::DataMessage;
use crate::queue::{MessageQueue, DATA_QUEUE};

/// Publishes pipeline snapshots to the GUI queue.
///
/// Telemetry is best-effort: a full queue drops the sample (the next
/// period sends a fresher one anyway). Opening the queue is the only
/// fatal operation.
pub struct Transmitter {
    queue: MessageQueue,
    pipeline: SharedCell<PipelineSignals>,
    started: Instant,
    debug_mode: bool,
}

impl Transmitter {
    /// Open the telemetry queue as a sender.
    ///
    /// With `debug_mode` the message carries all six pipeline signals;
    /// otherwise the compact triple `reference, control, plant_output`.
    pub fn new(pipeline: SharedCell<PipelineSignals>, debug_mode: bool) -> IpcResult<Self> {
        let queue = MessageQueue::open_sender(DATA_QUEUE)?;
        Ok(Self {
            queue,
            pipeline,
            started: Instant::now(),
            debug_mode,
        })
    }

    /// Seconds since the transmitter was created (message timestamps).
    pub fn elapsed_s(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Read the pipeline under its mutex and publish one telemetry record.
    pub fn send_snapshot(&self) -> IpcResult<()> {
        let snapshot = *self.pipeline.lock();
        let msg = if self.debug_mode {
            DataMessage::debug(
                [
                    snapshot.reference,
                    snapshot.error,
                    snapshot.control,
                    snapshot.actuation,
                    snapshot.plant_output,
                    snapshot.feedback,
                ],
                self.elapsed_s(),
            )
        } else {
            DataMessage::compact(
                snapshot.reference,
                snapshot.control,
                snapshot.plant_output,
                self.elapsed_s(),
            )
        };
        self.queue.send(&msg.to_bytes())
    }
}
