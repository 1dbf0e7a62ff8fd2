//! Process-global interrupt flag.
//!
//! SIGINT and SIGTERM flip a single atomic flag that every task loop checks
//! once per period. Handler installation happens exactly once, from the
//! main thread, before any task is constructed.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::error::{RuntimeError, RuntimeResult};

static SIGNAL_RUN: AtomicBool = AtomicBool::new(true);
static INSTALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(_sig: nix::libc::c_int) {
    SIGNAL_RUN.store(false, Ordering::Release);
}

/// Install the SIGINT/SIGTERM handlers. Idempotent.
pub fn install() -> RuntimeResult<()> {
    if INSTALLED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }
    let action = SigAction::new(
        SigHandler::Handler(handle_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe {
        sigaction(Signal::SIGINT, &action).map_err(RuntimeError::SignalInstall)?;
        sigaction(Signal::SIGTERM, &action).map_err(RuntimeError::SignalInstall)?;
    }
    Ok(())
}

/// True once an interrupt or terminate signal has been received.
pub fn interrupted() -> bool {
    !SIGNAL_RUN.load(Ordering::Acquire)
}
