//! Periodic IPC tasks.
//!
//! Both endpoints run at the communication rate with the same loop shape
//! and timing instrumentation as the pipeline tasks. IPC faults are
//! per-period events: queue-full drops the sample, an empty queue is not
//! an error, and a malformed message is logged and skipped. Construction
//! failures (timer, thread spawn) surface as runtime errors.

use std::time::Instant;

use cf_core::AbsoluteTimer;
use cf_runtime::signal_flag;
use cf_runtime::task::{micros, Task, Worker};
use cf_runtime::{RunFlag, RuntimeLogger, RuntimeResult, Status};

use crate::error::IpcError;
use crate::receiver::Receiver;
use crate::transmitter::Transmitter;

/// Periodic telemetry publisher.
pub struct TransmitterTask {
    worker: Worker,
}

impl TransmitterTask {
    /// Spawn the transmitter at `frequency_hz`.
    pub fn spawn(
        name: &str,
        transmitter: Transmitter,
        run: RunFlag,
        frequency_hz: f64,
        mut logger: RuntimeLogger,
    ) -> RuntimeResult<Self> {
        let mut timer = AbsoluteTimer::new(frequency_hz)?;
        let task_name = name.to_string();
        let worker = Worker::spawn(name, move || {
            let period = timer.period();
            let period_us = micros(period);
            let mut iteration: u64 = 0;
            let mut t_prev = Instant::now();

            loop {
                iteration += 1;
                let t0 = Instant::now();
                let ts_real = t0.duration_since(t_prev);
                t_prev = t0;

                if !run.is_running() || signal_flag::interrupted() {
                    break;
                }

                let t1 = Instant::now();
                match transmitter.send_snapshot() {
                    Ok(()) => {}
                    Err(IpcError::QueueFull { name }) => {
                        log::warn!("{task_name}: telemetry dropped, {name} full");
                    }
                    Err(e) => log::warn!("{task_name}: telemetry send failed: {e}"),
                }
                let t3 = Instant::now();

                let status = Status::classify(t3 - t0, period);
                logger.write_timing_row(
                    iteration,
                    micros(t1 - t0),
                    micros(t3 - t1),
                    micros(t3 - t0),
                    period_us,
                    micros(ts_real),
                    status,
                );

                if let Err(e) = timer.wait() {
                    log::warn!("{task_name}: periodic sleep failed: {e}");
                }
            }
        })?;
        Ok(Self { worker })
    }
}

impl Task for TransmitterTask {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn join(&mut self) -> RuntimeResult<()> {
        self.worker.join()
    }
}

/// Periodic parameter poller.
pub struct ReceiverTask {
    worker: Worker,
}

impl ReceiverTask {
    /// Spawn the receiver at `frequency_hz`.
    pub fn spawn(
        name: &str,
        receiver: Receiver,
        run: RunFlag,
        frequency_hz: f64,
        mut logger: RuntimeLogger,
    ) -> RuntimeResult<Self> {
        let mut timer = AbsoluteTimer::new(frequency_hz)?;
        let task_name = name.to_string();
        let worker = Worker::spawn(name, move || {
            let period = timer.period();
            let period_us = micros(period);
            let mut iteration: u64 = 0;
            let mut t_prev = Instant::now();

            loop {
                iteration += 1;
                let t0 = Instant::now();
                let ts_real = t0.duration_since(t_prev);
                t_prev = t0;

                if !run.is_running() || signal_flag::interrupted() {
                    break;
                }

                let t1 = Instant::now();
                match receiver.poll() {
                    Ok(Some(msg)) => {
                        log::debug!(
                            "{task_name}: parameters updated (kp={}, ki={}, kd={})",
                            msg.kp,
                            msg.ki,
                            msg.kd
                        );
                    }
                    Ok(None) => {} // no message this period
                    Err(e) => log::warn!("{task_name}: parameter receive failed: {e}"),
                }
                let t3 = Instant::now();

                let status = Status::classify(t3 - t0, period);
                logger.write_timing_row(
                    iteration,
                    micros(t1 - t0),
                    micros(t3 - t1),
                    micros(t3 - t0),
                    period_us,
                    micros(ts_real),
                    status,
                );

                if let Err(e) = timer.wait() {
                    log::warn!("{task_name}: periodic sleep failed: {e}");
                }
            }
        })?;
        Ok(Self { worker })
    }
}

impl Task for ReceiverTask {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn join(&mut self) -> RuntimeResult<()> {
        self.worker.join()
    }
}
