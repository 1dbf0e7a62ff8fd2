//! Per-task runtime logging with a bounded in-memory window.
//!
//! Each task owns one `RuntimeLogger`. Rows accumulate in a circular
//! buffer (oldest evicted first) and the whole window - header plus rows -
//! is rewritten to disk every `flush_interval` rows, so the on-disk file is
//! always a consistent snapshot of the most recent `capacity` rows.
//!
//! If the log directory or file cannot be written, the logger warns once
//! and keeps operating in memory only; logging never takes the task down.

use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use cf_core::config::{LOGGER_CAPACITY, LOGGER_FLUSH_INTERVAL};

use crate::status::Status;

const RULE_WIDTH: usize = 130;

/// Standard timing columns shared by every periodic task.
const TIMING_COLUMNS: [(&str, usize); 10] = [
    ("Iteration", 10),
    ("t_espera_us", 14),
    ("t_ejec_us", 14),
    ("t_total_us", 14),
    ("periodo_us", 14),
    ("Ts_Real_us", 14),
    ("drift_us", 14),
    ("%error_Ts", 12),
    ("%uso", 10),
    ("Status", 12),
];

/// Circular-buffer logger with whole-file rewrite semantics.
pub struct RuntimeLogger {
    path: Option<PathBuf>,
    header: String,
    columns: Vec<(String, usize)>,
    buffer: VecDeque<String>,
    capacity: usize,
    flush_interval: usize,
    pending: usize,
}

impl RuntimeLogger {
    /// Create a logger writing to
    /// `<dir>/<prefix>_runtime_<YYYYMMDD_HHMMSS>.txt`.
    ///
    /// The directory is created if absent; on failure the logger degrades
    /// to memory-only operation with a warning.
    pub fn new(prefix: &str, capacity: usize, dir: &Path) -> Self {
        let path = match fs::create_dir_all(dir) {
            Ok(()) => {
                let stamp = Local::now().format("%Y%m%d_%H%M%S");
                Some(dir.join(format!("{prefix}_runtime_{stamp}.txt")))
            }
            Err(e) => {
                log::warn!(
                    "RuntimeLogger: cannot create log directory {}: {e}; logging in memory only",
                    dir.display()
                );
                None
            }
        };
        Self {
            path,
            header: String::new(),
            columns: Vec::new(),
            buffer: VecDeque::new(),
            capacity: capacity.max(1),
            flush_interval: LOGGER_FLUSH_INTERVAL,
            pending: 0,
        }
    }

    /// Create a logger preset for a periodic task: default capacity, the
    /// standard timing columns and a header carrying the task's rate.
    pub fn for_task(prefix: &str, frequency_hz: f64, dir: &Path) -> Self {
        let mut logger = Self::new(prefix, LOGGER_CAPACITY, dir);
        logger.set_header(format!(
            "{prefix} Runtime Performance Log\nFrequency: {frequency_hz} Hz\nSample Period: {} us",
            1e6 / frequency_hz
        ));
        let names: Vec<&str> = TIMING_COLUMNS.iter().map(|(n, _)| *n).collect();
        let widths: Vec<usize> = TIMING_COLUMNS.iter().map(|(_, w)| *w).collect();
        logger.set_columns(&names, &widths);
        logger
    }

    /// Set the informative header block (may contain newlines).
    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = header.into();
    }

    /// Set column names and widths; missing widths default to 14.
    pub fn set_columns(&mut self, names: &[&str], widths: &[usize]) {
        self.columns = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), widths.get(i).copied().unwrap_or(14)))
            .collect();
    }

    /// Set the number of rows between automatic flushes (0 disables
    /// auto-flush; the final flush on drop still happens).
    pub fn set_flush_interval(&mut self, interval: usize) {
        self.flush_interval = interval;
    }

    /// Path of the log file, if file output is active.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Buffered rows, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.buffer.iter().map(|s| s.as_str())
    }

    /// Append a row to the circular buffer, evicting the oldest at
    /// capacity, and flush when the interval is reached or forced.
    pub fn write_line(&mut self, line: String, force_flush: bool) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(line);
        self.pending += 1;
        if force_flush || (self.flush_interval > 0 && self.pending >= self.flush_interval) {
            self.flush();
        }
    }

    /// Format and append one timing row. The derived columns are
    /// `drift = Ts_real - T`, `%error_Ts = drift/T * 100` and
    /// `%uso = t_total/T * 100`.
    #[allow(clippy::too_many_arguments)]
    pub fn write_timing_row(
        &mut self,
        iteration: u64,
        t_wait_us: f64,
        t_exec_us: f64,
        t_total_us: f64,
        period_us: f64,
        ts_real_us: f64,
        status: Status,
    ) {
        let drift_us = ts_real_us - period_us;
        let error_ts = drift_us / period_us * 100.0;
        let usage = t_total_us / period_us * 100.0;
        let line = format!(
            "{:<10}{:<14.2}{:<14.2}{:<14.2}{:<14.2}{:<14.2}{:<14.2}{:<12.2}{:<10.2}{:<12}",
            iteration,
            t_wait_us,
            t_exec_us,
            t_total_us,
            period_us,
            ts_real_us,
            drift_us,
            error_ts,
            usage,
            status.as_str()
        );
        self.write_line(line, status.forces_flush());
    }

    /// Rewrite the whole file (header + buffered rows).
    pub fn flush(&mut self) {
        self.pending = 0;
        let Some(path) = self.path.clone() else {
            return;
        };
        if let Err(e) = self.write_to_file(&path) {
            log::warn!(
                "RuntimeLogger: cannot write {}: {e}; logging in memory only",
                path.display()
            );
            self.path = None;
        }
    }

    fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(self.render_header().as_bytes())?;
        for line in &self.buffer {
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    fn render_header(&self) -> String {
        let mut out = String::new();
        if !self.header.is_empty() {
            out.push_str(&self.header);
            out.push('\n');
        }
        out.push_str(&format!(
            "Last Updated: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!(
            "Buffer Size: {}/{} lines\n",
            self.buffer.len(),
            self.capacity
        ));
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push('\n');
        if !self.columns.is_empty() {
            for (name, width) in &self.columns {
                let width = *width;
                out.push_str(&format!("{name:<width$}"));
            }
            out.push('\n');
            out.push_str(&"-".repeat(RULE_WIDTH));
            out.push('\n');
        }
        out
    }
}

impl Drop for RuntimeLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
