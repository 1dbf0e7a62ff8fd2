//! Reference generation task driving the signal switch.

use std::time::Instant;

use cf_core::AbsoluteTimer;
use cf_signals::SignalSwitch;

use crate::cells::{ControlParameters, PipelineSignals, RunFlag, SharedCell};
use crate::error::RuntimeResult;
use crate::logger::RuntimeLogger;
use crate::signal_flag;
use crate::status::Status;
use crate::task::{micros, Task, Worker};

/// Periodic task sampling the signal switch into the reference signal.
///
/// Each cycle reads `signal_type` and `setpoint` from the parameter cell,
/// applies them to the switch (selector + vertical offset of the selected
/// generator), samples it, and writes the result into `reference`. An
/// out-of-range `signal_type` keeps the previous selector and is reported
/// once per offending value.
pub struct SignalSwitchTask {
    worker: Worker,
}

impl SignalSwitchTask {
    /// Spawn the switch task at `frequency_hz`.
    pub fn spawn(
        name: &str,
        mut switch: SignalSwitch,
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
            let mut iteration: u64 = 0;
            let mut t_prev = Instant::now();
            let mut rejected_selector: Option<u8> = None;

            loop {
                iteration += 1;
                let t0 = Instant::now();
                let ts_real = t0.duration_since(t_prev);
                t_prev = t0;

                if !run.is_running() || signal_flag::interrupted() {
                    break;
                }

                let t1 = Instant::now();
                let (signal_type, setpoint) = {
                    let p = params.lock();
                    (p.signal_type, p.setpoint)
                };

                match switch.try_select(signal_type) {
                    Ok(()) => rejected_selector = None,
                    Err(e) => {
                        if rejected_selector != Some(signal_type) {
                            log::warn!("{task_name}: {e}; keeping previous selector");
                            rejected_selector = Some(signal_type);
                        }
                    }
                }
                switch.set_offset(setpoint);
                let value = switch.next();

                {
                    let mut cell = pipeline.lock();
                    cell.reference = value;
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

impl Task for SignalSwitchTask {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn join(&mut self) -> RuntimeResult<()> {
        self.worker.join()
    }
}
