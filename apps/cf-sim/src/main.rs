use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use cf_sim::{run, SimOptions};

#[derive(Parser)]
#[command(name = "cf-sim")]
#[command(about = "ctrlflow - soft-real-time closed-loop PID simulator", long_about = None)]
struct Cli {
    /// Directory for per-task runtime logs
    #[arg(long, default_value = cf_core::config::LOG_DIRECTORY)]
    log_dir: PathBuf,

    /// Stop automatically after this many seconds (default: run until
    /// interrupted)
    #[arg(long)]
    duration_s: Option<f64>,

    /// Send all six pipeline signals in telemetry instead of three
    #[arg(long)]
    debug_telemetry: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let options = SimOptions {
        log_dir: cli.log_dir,
        debug_telemetry: cli.debug_telemetry,
        duration: cli.duration_s.map(Duration::from_secs_f64),
    };

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cf-sim: {e}");
            ExitCode::FAILURE
        }
    }
}
