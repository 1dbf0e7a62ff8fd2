//! Per-cycle status classification.

use std::time::Duration;

use cf_core::config::{CRITICAL_THRESHOLD, WARNING_THRESHOLD};

/// Outcome of one task cycle, recorded in the timing log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Cycle finished within 90% of the period.
    Ok,
    /// Cycle used more than 90% of the period but met the deadline.
    Warning,
    /// Cycle overran the period; the next wait returns immediately.
    Critical,
    /// A bounded-wait lock timed out (PID path only).
    ErrorMutex,
}

impl Status {
    /// Classify a cycle from its total time and the task period.
    pub fn classify(t_total: Duration, period: Duration) -> Self {
        let total = t_total.as_secs_f64();
        let t = period.as_secs_f64();
        if total > CRITICAL_THRESHOLD * t {
            Status::Critical
        } else if total > WARNING_THRESHOLD * t {
            Status::Warning
        } else {
            Status::Ok
        }
    }

    /// The fixed string written into log rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::ErrorMutex => "ERROR_MUTEX",
        }
    }

    /// Whether a row with this status forces an immediate log flush.
    pub fn forces_flush(self) -> bool {
        matches!(self, Status::Critical | Status::ErrorMutex)
    }
}
