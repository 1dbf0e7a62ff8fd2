//! PID executor with bounded-wait locking and live gain updates.

use std::time::Instant;

use cf_blocks::{Block, Pid};
use cf_core::config::TIMED_LOCK_FRACTION;
use cf_core::AbsoluteTimer;

use crate::cells::{ControlParameters, PipelineSignals, RunFlag, SharedCell};
use crate::error::RuntimeResult;
use crate::logger::RuntimeLogger;
use crate::signal_flag;
use crate::status::Status;
use crate::task::{micros, Task, Worker};

/// Periodic PID task.
///
/// Unlike the generic executors, every cell acquisition is bounded to 20%
/// of the task period. The controller must not miss its deadline because
/// another task is sitting on a mutex:
///
/// - input read times out -> the previous error sample is reused
/// - parameter read times out -> the last-read gains stay in effect
/// - output write times out -> this cycle's write is dropped (the D/A
///   keeps applying the previous sample)
///
/// Any timeout tags the cycle `ERROR_MUTEX` and the loop proceeds to the
/// next period. Gains are copied from the parameter cell into the block
/// between the step and the output write, so a retune received during
/// cycle `k` is in effect for cycle `k + 1`.
pub struct PidTask {
    worker: Worker,
}

impl PidTask {
    /// Spawn the PID task at `frequency_hz`, reading `error` and writing
    /// `control` in the pipeline cell.
    pub fn spawn(
        name: &str,
        mut pid: Pid,
        pipeline: SharedCell<PipelineSignals>,
        params: SharedCell<ControlParameters>,
        run: RunFlag,
        frequency_hz: f64,
        mut logger: RuntimeLogger,
    ) -> RuntimeResult<Self> {
        let mut timer = AbsoluteTimer::new(frequency_hz)?;
        let task_name = name.to_string();
        let worker = Worker::spawn(name, move || {
            let period = timer.period();
            let period_us = micros(period);
            let timeout = period.mul_f64(TIMED_LOCK_FRACTION);
            let mut iteration: u64 = 0;
            let mut t_prev = Instant::now();
            let mut cached_error = 0.0;

            loop {
                iteration += 1;
                let t0 = Instant::now();
                let ts_real = t0.duration_since(t_prev);
                t_prev = t0;

                if !run.is_running() || signal_flag::interrupted() {
                    break;
                }

                let mut lock_timeout = false;

                let t1 = Instant::now();
                let e = match pipeline.try_lock_for(timeout) {
                    Some(cell) => {
                        cached_error = cell.error;
                        cached_error
                    }
                    None => {
                        lock_timeout = true;
                        cached_error
                    }
                };

                let u = pid.step(e);

                match params.try_lock_for(timeout) {
                    Some(p) => pid.set_gains(p.kp, p.ki, p.kd),
                    None => lock_timeout = true,
                }

                match pipeline.try_lock_for(timeout) {
                    Some(mut cell) => cell.control = u,
                    None => lock_timeout = true,
                }
                let t3 = Instant::now();

                let status = if lock_timeout {
                    Status::ErrorMutex
                } else {
                    Status::classify(t3 - t0, period)
                };
                logger.write_timing_row(
                    iteration,
                    micros(t1 - t0),
                    micros(t3 - t1),
                    micros(t3 - t0),
                    period_us,
                    micros(ts_real),
                    status,
                );

                if let Err(err) = timer.wait() {
                    log::warn!("{task_name}: periodic sleep failed: {err}");
                }
            }
        })?;
        Ok(Self { worker })
    }
}

impl Task for PidTask {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn join(&mut self) -> RuntimeResult<()> {
        self.worker.join()
    }
}
