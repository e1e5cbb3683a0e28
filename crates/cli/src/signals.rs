//! Shutdown signals
//!
//! SIGINT, SIGTERM and SIGHUP clear a flag. The handlers are installed
//! without `SA_RESTART`, so a blocked `read` on the inotify descriptor
//! returns `EINTR` and the event loop gets to observe the flag.

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn on_shutdown_signal(_: nix::libc::c_int) {
    RUNNING.store(false, Ordering::SeqCst);
}

pub fn install_handlers() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_shutdown_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        // SAFETY: the handler only stores to an atomic
        unsafe { sigaction(signal, &action) }?;
    }
    Ok(())
}

/// False once a shutdown signal arrived
pub fn keep_running() -> bool {
    RUNNING.load(Ordering::SeqCst)
}
