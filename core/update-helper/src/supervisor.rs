//! Detaching the background worker.
//!
//! The dispatcher gives the helper a few seconds before it is killed, while
//! an update check can take minutes. The worker therefore runs in a forked
//! child that leads its own session and owns no inherited stdio:
//!
//! 1. `detach`: `fork()`; the parent returns to write `{}` and exit
//! 2. child, `isolate`: `setsid()` so the parent's exit does not signal it
//! 3. child, `isolate`: point fds 0, 1 and 2 at `/dev/null`
//! 4. child runs the worker
//!
//! The child returns from `detach` without logging. It calls `isolate` once
//! it has left the parent's span, so its lines carry only its own pid.
//!
//! `detach` must be called while the process is single-threaded. Logging is
//! synchronous for that reason.

use software_updates_core::{HelperError, Result};
use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detached {
    /// The invoking process; `child` is the worker's pid.
    Parent { child: u32 },
    /// The detached worker process.
    Child,
}

#[allow(unsafe_code)]
pub fn detach() -> Result<Detached> {
    // SAFETY: fork() is called before any thread is spawned (no async runtime,
    // no non-blocking log writer, no bus connection yet), so the child starts
    // with a consistent copy of the only thread.
    let pid = unsafe { libc::fork() };

    match pid {
        -1 => Err(HelperError::DetachFailure(io::Error::last_os_error())),
        0 => Ok(Detached::Child),
        child => Ok(Detached::Parent {
            child: child as u32,
        }),
    }
}

/// Cuts the forked worker loose from the dispatcher's session and stdio.
/// Failures are logged; the worker keeps going either way.
pub fn isolate() {
    if let Err(err) = become_session_leader() {
        tracing::warn!(error = %err, "setsid failed; continuing in parent session");
    }
    if let Err(err) = redirect_stdio() {
        tracing::warn!(error = %err, "Failed to redirect stdio to /dev/null");
    }
    tracing::debug!("Forked");
}

#[allow(unsafe_code)]
fn become_session_leader() -> io::Result<()> {
    // SAFETY: setsid() has no memory-safety preconditions.
    if unsafe { libc::setsid() } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[allow(unsafe_code)]
fn redirect_stdio() -> io::Result<()> {
    let null = OpenOptions::new().read(true).write(true).open("/dev/null")?;
    for fd in 0..=2 {
        // SAFETY: both descriptors are valid; dup2 atomically replaces `fd`.
        if unsafe { libc::dup2(null.as_raw_fd(), fd) } == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
