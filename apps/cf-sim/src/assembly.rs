//! Topology assembler: builds and runs the closed control loop.
//!
//! ```text
//! switch -> ref -+
//!                +-> sum -> e -> PID -> u -> D/A -> ua -> plant -> yk -> A/D -> ykd
//!   ykd  --------+                                                          (fed back)
//! ```
//!
//! Component tasks run at 1 kHz, the controller at 100 Hz, IPC at 10 Hz.
//! Every block is constructed with `Ts = 1/f` of the task that runs it.
//! Shutdown joins tasks in reverse construction order, then unlinks the
//! IPC queues.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use cf_blocks::{tustin, Delay, Hold, Pid, Subtract, TransferFunction};
use cf_core::config::{
    FREQ_COMMUNICATION, FREQ_COMPONENT, FREQ_CONTROLLER, TS_COMPONENT, TS_CONTROLLER,
};
use cf_ipc::{MessageQueue, Receiver, ReceiverTask, Transmitter, TransmitterTask, DATA_QUEUE,
    PARAMS_QUEUE};
use cf_runtime::{
    shared, ControlParameters, MonitorTask, PeriodicTask, PidTask, PipelineSignals, RunFlag,
    RuntimeLogger, SharedCell, SharedSwitch, SignalSwitchTask, Task, TwoInputTask,
};
use cf_signals::{PwmSignal, SignalKind, SignalSwitch, SineSignal, StepSignal};

use crate::error::AppResult;

/// Default reference waveforms offered by the switch.
const STEP_AMPLITUDE: f64 = 1.0;
const STEP_TIME_S: f64 = 0.05;
const PWM_AMPLITUDE: f64 = 1.0;
const PWM_DUTY: f64 = 0.5;
const PWM_PERIOD_S: f64 = 1.0;
const SINE_AMPLITUDE: f64 = 1.0;
const SINE_FREQ_HZ: f64 = 1.0;

/// Assembly options from the CLI surface.
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Directory for the per-task runtime logs.
    pub log_dir: PathBuf,
    /// Send all six pipeline signals instead of the compact triple.
    pub debug_telemetry: bool,
    /// Stop automatically after this long (scripted runs); `None` runs
    /// until a signal or the run switch stops the loop.
    pub duration: Option<Duration>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(cf_core::config::LOG_DIRECTORY),
            debug_telemetry: false,
            duration: None,
        }
    }
}

/// The assembled pipeline: cells plus every running task.
pub struct Simulator {
    pipeline: SharedCell<PipelineSignals>,
    params: SharedCell<ControlParameters>,
    run: RunFlag,
    operator_switch: SharedSwitch,
    /// Construction order; joined in reverse.
    tasks: Vec<Box<dyn Task>>,
}

impl Simulator {
    /// Allocate the cells, build every block with its matched `Ts`, open
    /// the IPC endpoints and start all tasks.
    ///
    /// Any error here is an initialisation failure; tasks already started
    /// are stopped and joined before the error is returned.
    pub fn start(options: &SimOptions) -> AppResult<Self> {
        let pipeline = shared(PipelineSignals::default());
        let params = shared(ControlParameters::default());
        let run = RunFlag::new(true);
        let operator_switch = SharedSwitch::new(true);

        let mut tasks: Vec<Box<dyn Task>> = Vec::new();
        if let Err(e) = Self::build(
            options,
            &pipeline,
            &params,
            &run,
            &operator_switch,
            &mut tasks,
        ) {
            // The flag must clear before the partially built pipeline is
            // joined, or the join would wait on running tasks forever.
            run.stop();
            for task in tasks.iter_mut().rev() {
                let _ = task.join();
            }
            return Err(e);
        }

        log::info!("pipeline assembled: {} tasks running", tasks.len());
        Ok(Self {
            pipeline,
            params,
            run,
            operator_switch,
            tasks,
        })
    }

    fn build(
        options: &SimOptions,
        pipeline: &SharedCell<PipelineSignals>,
        params: &SharedCell<ControlParameters>,
        run: &RunFlag,
        operator_switch: &SharedSwitch,
        tasks: &mut Vec<Box<dyn Task>>,
    ) -> AppResult<()> {
        // Reference generation.
        let switch = SignalSwitch::new(
            StepSignal::new(TS_COMPONENT, STEP_AMPLITUDE, STEP_TIME_S, 0.0)?,
            PwmSignal::new(TS_COMPONENT, PWM_AMPLITUDE, PWM_DUTY, PWM_PERIOD_S, 0.0)?,
            SineSignal::new(TS_COMPONENT, SINE_AMPLITUDE, SINE_FREQ_HZ, 0.0, 0.0)?,
            SignalKind::Step,
        );
        tasks.push(Box::new(SignalSwitchTask::spawn(
            "SignalSwitch",
            switch,
            pipeline.clone(),
            params.clone(),
            run.clone(),
            FREQ_COMPONENT,
            RuntimeLogger::for_task("SignalSwitch", FREQ_COMPONENT, &options.log_dir),
        )?));

        // Summing junction: e = ref - ykd.
        tasks.push(Box::new(TwoInputTask::spawn(
            "Sum",
            Subtract::new(TS_COMPONENT)?,
            pipeline.clone(),
            |cell| (cell.reference, cell.feedback),
            |cell, e| cell.error = e,
            run.clone(),
            FREQ_COMPONENT,
            RuntimeLogger::for_task("Sum", FREQ_COMPONENT, &options.log_dir),
        )?));

        // Controller, seeded from the parameter defaults.
        let (kp, ki, kd) = {
            let p = params.lock();
            (p.kp, p.ki, p.kd)
        };
        tasks.push(Box::new(PidTask::spawn(
            "PID",
            Pid::new(kp, ki, kd, TS_CONTROLLER)?,
            pipeline.clone(),
            params.clone(),
            run.clone(),
            FREQ_CONTROLLER,
            RuntimeLogger::for_task("PID", FREQ_CONTROLLER, &options.log_dir),
        )?));

        // D/A hold: u -> ua.
        tasks.push(Box::new(PeriodicTask::spawn(
            "DA",
            Hold::new(TS_COMPONENT)?,
            pipeline.clone(),
            |cell| cell.control,
            |cell, ua| cell.actuation = ua,
            run.clone(),
            FREQ_COMPONENT,
            RuntimeLogger::for_task("DA", FREQ_COMPONENT, &options.log_dir),
        )?));

        // Plant 1/(s+1), Tustin-discretised at the component rate.
        let dtf = tustin(&[1.0], &[1.0, 1.0], TS_COMPONENT)?;
        tasks.push(Box::new(PeriodicTask::spawn(
            "Plant",
            TransferFunction::new(dtf.b, dtf.a, TS_COMPONENT)?,
            pipeline.clone(),
            |cell| cell.actuation,
            |cell, yk| cell.plant_output = yk,
            run.clone(),
            FREQ_COMPONENT,
            RuntimeLogger::for_task("Plant", FREQ_COMPONENT, &options.log_dir),
        )?));

        // A/D sampler: yk -> ykd.
        tasks.push(Box::new(PeriodicTask::spawn(
            "AD",
            Delay::new(TS_COMPONENT)?,
            pipeline.clone(),
            |cell| cell.plant_output,
            |cell, ykd| cell.feedback = ykd,
            run.clone(),
            FREQ_COMPONENT,
            RuntimeLogger::for_task("AD", FREQ_COMPONENT, &options.log_dir),
        )?));

        // IPC endpoints; queue creation failure is fatal.
        let transmitter = Transmitter::new(pipeline.clone(), options.debug_telemetry)?;
        tasks.push(Box::new(TransmitterTask::spawn(
            "Transmitter",
            transmitter,
            run.clone(),
            FREQ_COMMUNICATION,
            RuntimeLogger::for_task("Transmitter", FREQ_COMMUNICATION, &options.log_dir),
        )?));

        let receiver = Receiver::new(params.clone())?;
        tasks.push(Box::new(ReceiverTask::spawn(
            "Receiver",
            receiver,
            run.clone(),
            FREQ_COMMUNICATION,
            RuntimeLogger::for_task("Receiver", FREQ_COMMUNICATION, &options.log_dir),
        )?));

        // Run/stop monitor, constructed last.
        tasks.push(Box::new(MonitorTask::spawn(
            "Monitor",
            operator_switch.clone(),
            run.clone(),
        )?));

        Ok(())
    }

    /// Shared handle to the pipeline signals (tests, diagnostics).
    pub fn pipeline(&self) -> SharedCell<PipelineSignals> {
        self.pipeline.clone()
    }

    /// Shared handle to the controller parameters.
    pub fn params(&self) -> SharedCell<ControlParameters> {
        self.params.clone()
    }

    /// The cooperative run flag.
    pub fn run_flag(&self) -> RunFlag {
        self.run.clone()
    }

    /// The operator-level run switch observed by the monitor.
    pub fn operator_switch(&self) -> SharedSwitch {
        self.operator_switch.clone()
    }

    /// Block the calling thread until the pipeline stops, or until
    /// `duration` elapses (which then commands the stop).
    pub fn wait(&self, duration: Option<Duration>) {
        let started = Instant::now();
        while self.run.is_running() {
            if let Some(limit) = duration {
                if started.elapsed() >= limit {
                    log::info!("configured duration elapsed, stopping");
                    self.run.stop();
                    break;
                }
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    /// Stop the pipeline, join every task in reverse construction order
    /// and tear down the IPC queue names.
    pub fn shutdown(mut self) {
        self.run.stop();
        for task in self.tasks.iter_mut().rev() {
            if let Err(e) = task.join() {
                log::error!("joining {}: {e}", task.name());
            }
        }
        self.tasks.clear();
        for queue in [DATA_QUEUE, PARAMS_QUEUE] {
            if let Err(e) = MessageQueue::unlink(queue) {
                log::warn!("unlinking {}: {e}", queue.name);
            }
        }
        log::info!("pipeline shut down");
    }
}

/// Assemble, run to completion, and tear down.
pub fn run(options: SimOptions) -> AppResult<()> {
    cf_runtime::signal_flag::install()?;
    let simulator = Simulator::start(&options)?;
    simulator.wait(options.duration);
    simulator.shutdown();
    Ok(())
}
