//! Threaded runtime behaviour: shutdown, deadline misses, lock timeouts.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use cf_blocks::{Block, BlockResult, Hold, Pid, SampledSystem};
use cf_runtime::{
    shared, PeriodicTask, PidTask, PipelineSignals, ControlParameters, RunFlag, RuntimeLogger,
    Task,
};

fn temp_log_dir(tag: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("cf-task-test-{tag}-{}-{n}", std::process::id()))
}

/// Block whose step sleeps for 1.5x the task period: every cycle misses its
/// deadline.
struct SlowBlock {
    ts: f64,
    sleep: Duration,
}

impl SlowBlock {
    fn new(ts: f64) -> BlockResult<Self> {
        Ok(Self {
            ts,
            sleep: Duration::from_secs_f64(1.5 * ts),
        })
    }
}

impl SampledSystem for SlowBlock {
    fn sampling_period(&self) -> f64 {
        self.ts
    }

    fn reset(&mut self) {}
}

impl Block for SlowBlock {
    fn step(&mut self, u: f64) -> f64 {
        std::thread::sleep(self.sleep);
        u
    }
}

#[test]
fn tasks_stop_within_bounded_time() {
    let dir = temp_log_dir("shutdown");
    let pipeline = shared(PipelineSignals::default());
    let run = RunFlag::new(true);
    let freq = 200.0; // 5 ms period

    let mut tasks: Vec<Box<dyn Task>> = Vec::new();
    for name in ["hold-a", "hold-b", "hold-c"] {
        let logger = RuntimeLogger::for_task(name, freq, &dir);
        let task = PeriodicTask::spawn(
            name,
            Hold::new(1.0 / freq).unwrap(),
            pipeline.clone(),
            |cell| cell.control,
            |cell, y| cell.actuation = y,
            run.clone(),
            freq,
            logger,
        )
        .unwrap();
        tasks.push(Box::new(task));
    }

    std::thread::sleep(Duration::from_millis(100));
    run.stop();
    let start = Instant::now();
    for task in tasks.iter_mut().rev() {
        task.join().unwrap();
    }
    // Every task observes the flag within one period and exits within
    // another; generous slack for loaded machines.
    assert!(
        start.elapsed() < Duration::from_millis(500),
        "join took {:?}",
        start.elapsed()
    );
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn deadline_misses_are_critical_but_make_progress() {
    let dir = temp_log_dir("overrun");
    let pipeline = shared(PipelineSignals::default());
    let run = RunFlag::new(true);
    let freq = 50.0; // 20 ms period, block sleeps 30 ms

    let logger = RuntimeLogger::for_task("slow", freq, &dir);
    let log_path = logger.path().unwrap().to_path_buf();
    let mut task = PeriodicTask::spawn(
        "slow",
        SlowBlock::new(1.0 / freq).unwrap(),
        pipeline.clone(),
        |cell| cell.control,
        |cell, y| cell.actuation = y,
        run.clone(),
        freq,
        logger,
    )
    .unwrap();

    std::thread::sleep(Duration::from_millis(250));
    run.stop();
    task.join().unwrap();

    let content = fs::read_to_string(&log_path).unwrap();
    let rows: Vec<&str> = content
        .lines()
        .filter(|l| l.contains("CRITICAL"))
        .collect();
    // Several overrunning cycles completed: the task kept making progress.
    assert!(rows.len() >= 3, "rows: {content}");
    // Iteration counter (first column) strictly increases.
    let iterations: Vec<u64> = rows
        .iter()
        .map(|l| l.split_whitespace().next().unwrap().parse().unwrap())
        .collect();
    for pair in iterations.windows(2) {
        assert!(pair[1] > pair[0], "iterations not increasing: {iterations:?}");
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn pid_task_drives_control_from_error() {
    let dir = temp_log_dir("pid");
    let pipeline = shared(PipelineSignals {
        error: 1.0,
        ..Default::default()
    });
    // No derivative action: a constant error would otherwise produce a
    // derivative kick when the gains are first copied in.
    let params = shared(ControlParameters {
        kp: 1.0,
        ki: 5.0,
        kd: 0.0,
        setpoint: 0.0,
        signal_type: 0,
    });
    let run = RunFlag::new(true);
    let freq = 100.0;

    let logger = RuntimeLogger::for_task("pid", freq, &dir);
    let pid = Pid::new(1.0, 5.0, 0.0, 1.0 / freq).unwrap();
    let mut task = PidTask::spawn(
        "pid",
        pid,
        pipeline.clone(),
        params.clone(),
        run.clone(),
        freq,
        logger,
    )
    .unwrap();

    std::thread::sleep(Duration::from_millis(200));
    let u = pipeline.lock().control;
    run.stop();
    task.join().unwrap();

    // Constant positive error with integral action: control grew past Kp*e.
    assert!(u > 1.2, "control = {u}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn pid_task_tags_lock_timeouts() {
    let dir = temp_log_dir("mutex");
    let pipeline = shared(PipelineSignals::default());
    let params = shared(ControlParameters::default());
    let run = RunFlag::new(true);
    let freq = 50.0; // 20 ms period -> 4 ms lock timeout

    let logger = RuntimeLogger::for_task("pid-contended", freq, &dir);
    let log_path = logger.path().unwrap().to_path_buf();
    let pid = Pid::new(1.0, 0.0, 0.0, 1.0 / freq).unwrap();
    let mut task = PidTask::spawn(
        "pid-contended",
        pid,
        pipeline.clone(),
        params.clone(),
        run.clone(),
        freq,
        logger,
    )
    .unwrap();

    // Let a few clean cycles through, then sit on the pipeline mutex for
    // several periods.
    std::thread::sleep(Duration::from_millis(60));
    {
        let _guard = pipeline.lock();
        std::thread::sleep(Duration::from_millis(120));
    }
    std::thread::sleep(Duration::from_millis(60));

    run.stop();
    task.join().unwrap();

    let content = fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("ERROR_MUTEX"), "log was: {content}");
    // The task survived the contention and kept cycling afterwards.
    assert!(content.contains("OK"), "log was: {content}");
    let _ = fs::remove_dir_all(&dir);
}
