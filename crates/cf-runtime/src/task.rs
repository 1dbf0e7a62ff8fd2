//! Periodic task executors.
//!
//! A task wraps a block, binds it to fields of the pipeline cell and runs
//! it on its own thread at a fixed rate. The worker is spawned by the
//! constructor and joined by [`Task::join`] (or on drop). Each cycle is
//! instrumented and logged:
//!
//! ```text
//! t0            flag check
//! t1            input read under the cell mutex
//!               block step
//!               output write under the cell mutex
//! t3            classify + log row, absolute wait
//! ```
//!
//! Runtime faults (sleep errors, overruns) never unwind the worker; they
//! are recorded in the task's log and the loop continues.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cf_blocks::{Block, TwoInputBlock};
use cf_core::AbsoluteTimer;

use crate::cells::{PipelineSignals, RunFlag, SharedCell};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logger::RuntimeLogger;
use crate::signal_flag;
use crate::status::Status;

/// A running periodic worker that can be joined by name.
///
/// Join order matters at shutdown: the assembler joins tasks in reverse
/// construction order before tearing anything else down.
pub trait Task: Send {
    /// The task's name (also its log prefix).
    fn name(&self) -> &str;

    /// Wait for the worker thread to exit. Idempotent.
    fn join(&mut self) -> RuntimeResult<()>;
}

/// Duration in microseconds, as logged.
pub fn micros(d: Duration) -> f64 {
    d.as_secs_f64() * 1e6
}

/// Owned worker thread, joined on drop.
pub struct Worker {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a named worker thread. Spawn failure is fatal to the task.
    pub fn spawn<F>(name: &str, body: F) -> RuntimeResult<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(body)
            .map_err(|source| RuntimeError::ThreadSpawn {
                name: name.to_string(),
                source,
            })?;
        Ok(Self {
            name: name.to_string(),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Join the worker; a panic in the worker is reported, not re-thrown.
    pub fn join(&mut self) -> RuntimeResult<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| RuntimeError::ThreadPanicked {
                name: self.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            log::error!("{e}");
        }
    }
}

/// Executor for a one-input block bound to pipeline fields.
pub struct PeriodicTask {
    worker: Worker,
}

impl PeriodicTask {
    /// Spawn a task running `block` at `frequency_hz`, reading its input
    /// and writing its output through the given accessors.
    ///
    /// The constructor returns once the worker thread exists; the loop runs
    /// until the run flag clears or the process is signalled.
    pub fn spawn<B, R, W>(
        name: &str,
        mut block: B,
        pipeline: SharedCell<PipelineSignals>,
        read: R,
        write: W,
        run: RunFlag,
        frequency_hz: f64,
        mut logger: RuntimeLogger,
    ) -> RuntimeResult<Self>
    where
        B: Block + Send + 'static,
        R: Fn(&PipelineSignals) -> f64 + Send + 'static,
        W: Fn(&mut PipelineSignals, f64) + Send + 'static,
    {
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
                let input = {
                    let cell = pipeline.lock();
                    read(&cell)
                };
                let y = block.step(input);
                {
                    let mut cell = pipeline.lock();
                    write(&mut cell, y);
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

impl Task for PeriodicTask {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn join(&mut self) -> RuntimeResult<()> {
        self.worker.join()
    }
}

/// Executor for a two-input block (the summing junction).
///
/// Both inputs are read under a single acquisition of the pipeline mutex.
pub struct TwoInputTask {
    worker: Worker,
}

impl TwoInputTask {
    /// Spawn a task running a two-input `block` at `frequency_hz`.
    pub fn spawn<B, R, W>(
        name: &str,
        mut block: B,
        pipeline: SharedCell<PipelineSignals>,
        read: R,
        write: W,
        run: RunFlag,
        frequency_hz: f64,
        mut logger: RuntimeLogger,
    ) -> RuntimeResult<Self>
    where
        B: TwoInputBlock + Send + 'static,
        R: Fn(&PipelineSignals) -> (f64, f64) + Send + 'static,
        W: Fn(&mut PipelineSignals, f64) + Send + 'static,
    {
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
                let (u1, u2) = {
                    let cell = pipeline.lock();
                    read(&cell)
                };
                let y = block.step2(u1, u2);
                {
                    let mut cell = pipeline.lock();
                    write(&mut cell, y);
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

impl Task for TwoInputTask {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn join(&mut self) -> RuntimeResult<()> {
        self.worker.join()
    }
}
