//! Run/stop monitor task.

use cf_core::config::FREQ_MONITOR;
use cf_core::AbsoluteTimer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cells::RunFlag;
use crate::error::RuntimeResult;
use crate::signal_flag;
use crate::task::{Task, Worker};

/// A user-level run/stop source polled by the monitor.
pub trait RunSwitch: Send + 'static {
    /// True while the operator wants the simulator running.
    fn is_on(&self) -> bool;
}

/// Run switch backed by a shared atomic, settable from anywhere.
#[derive(Debug, Clone)]
pub struct SharedSwitch(Arc<AtomicBool>);

impl SharedSwitch {
    pub fn new(on: bool) -> Self {
        Self(Arc::new(AtomicBool::new(on)))
    }

    /// Flip the switch.
    pub fn set(&self, on: bool) {
        self.0.store(on, Ordering::Release);
    }
}

impl RunSwitch for SharedSwitch {
    fn is_on(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Low-rate task watching the run/stop source and the process-signal flag.
///
/// On any stop transition (switch off, SIGINT/SIGTERM) it clears the shared
/// run flag - which every task observes within one of its periods - and
/// exits.
pub struct MonitorTask {
    worker: Worker,
}

impl MonitorTask {
    /// Spawn the monitor polling at the default 10 Hz.
    pub fn spawn(name: &str, switch: impl RunSwitch, run: RunFlag) -> RuntimeResult<Self> {
        Self::spawn_at(name, switch, run, FREQ_MONITOR)
    }

    /// Spawn the monitor polling at `frequency_hz`.
    pub fn spawn_at(
        name: &str,
        switch: impl RunSwitch,
        run: RunFlag,
        frequency_hz: f64,
    ) -> RuntimeResult<Self> {
        let mut timer = AbsoluteTimer::new(frequency_hz)?;
        let task_name = name.to_string();
        let worker = Worker::spawn(name, move || loop {
            if signal_flag::interrupted() {
                log::info!("{task_name}: interrupt received, stopping pipeline");
                run.stop();
                break;
            }
            if !switch.is_on() {
                log::info!("{task_name}: run switch off, stopping pipeline");
                run.stop();
                break;
            }
            if !run.is_running() {
                break;
            }
            if let Err(e) = timer.wait() {
                log::warn!("{task_name}: periodic sleep failed: {e}");
            }
        })?;
        Ok(Self { worker })
    }
}

impl Task for MonitorTask {
    fn name(&self) -> &str {
        self.worker.name()
    }

    fn join(&mut self) -> RuntimeResult<()> {
        self.worker.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn switch_off_clears_run_flag() {
        let run = RunFlag::new(true);
        let switch = SharedSwitch::new(true);
        let mut monitor =
            MonitorTask::spawn_at("monitor-test", switch.clone(), run.clone(), 100.0).unwrap();

        std::thread::sleep(Duration::from_millis(30));
        assert!(run.is_running());

        switch.set(false);
        let start = Instant::now();
        monitor.join().unwrap();
        assert!(!run.is_running());
        // Observed within a couple of monitor periods.
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn external_stop_ends_monitor() {
        let run = RunFlag::new(true);
        let mut monitor =
            MonitorTask::spawn_at("monitor-ext", SharedSwitch::new(true), run.clone(), 100.0)
                .unwrap();
        run.stop();
        monitor.join().unwrap();
    }
}
