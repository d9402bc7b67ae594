//! `waitpid(2)` for children of the shell.
use std::{fmt, io};

use libc::{c_int, WEXITSTATUS, WIFEXITED, WIFSIGNALED, WNOHANG, WTERMSIG};

use crate::cutils::cerr;
use crate::system::{
    interface::ProcessId,
    signal::{signal_name, SignalNumber},
};

mod sealed {
    pub(crate) trait Sealed {}

    impl Sealed for crate::system::interface::ProcessId {}
}

pub(crate) trait Wait: sealed::Sealed {
    /// Collect a terminated child. [`ProcessId::ANY_CHILD`] matches whichever child of the
    /// calling process terminates first.
    ///
    /// Performs no allocation; the background reaper calls this from its SIGCHLD handler.
    fn wait(self, options: WaitOptions) -> Result<(ProcessId, WaitStatus), WaitError>;
}

impl Wait for ProcessId {
    fn wait(self, options: WaitOptions) -> Result<(ProcessId, WaitStatus), WaitError> {
        let mut raw: c_int = 0;

        match cerr(unsafe { libc::waitpid(self.get(), &mut raw, options.flags) }) {
            Err(err) => Err(WaitError::Io(err)),
            // only reported with WNOHANG
            Ok(0) => Err(WaitError::NotReady),
            Ok(pid) => Ok((ProcessId::new(pid), WaitStatus(raw))),
        }
    }
}

/// The child that the next [`ProcessId::ANY_CHILD`] wait would collect, left uncollected.
///
/// Performs no allocation. Returns [`WaitError::NotReady`] when no child has terminated yet.
pub(crate) fn next_terminated() -> Result<ProcessId, WaitError> {
    // SAFETY: `siginfo_t` is a C struct, all-zeroes is a valid representation
    let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };

    cerr(unsafe {
        libc::waitid(
            libc::P_ALL,
            0,
            &mut info,
            libc::WEXITED | libc::WNOHANG | libc::WNOWAIT,
        )
    })
    .map_err(WaitError::Io)?;

    // `si_pid` stays zero when WNOHANG found nothing
    match unsafe { info.si_pid() } {
        0 => Err(WaitError::NotReady),
        pid => Ok(ProcessId::new(pid)),
    }
}

#[derive(Debug)]
pub enum WaitError {
    /// Matching children exist but none has terminated yet. Only with [`WaitOptions::no_hang`].
    NotReady,
    /// `ECHILD` when nothing is left to wait for, `EINTR` when a handler ran.
    Io(io::Error),
}

impl WaitError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WaitError::Io(err) if err.kind() == io::ErrorKind::Interrupted)
    }
}

#[derive(Clone, Copy)]
pub struct WaitOptions {
    flags: c_int,
}

impl WaitOptions {
    /// Block until a matching child terminates.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    pub const fn no_hang(self) -> Self {
        Self {
            flags: self.flags | WNOHANG,
        }
    }
}

/// The raw status `waitpid` reported for a child.
pub struct WaitStatus(c_int);

impl WaitStatus {
    /// The code passed to `exit`, if the child exited on its own.
    pub const fn exit_status(&self) -> Option<c_int> {
        if WIFEXITED(self.0) {
            Some(WEXITSTATUS(self.0))
        } else {
            None
        }
    }

    /// The signal that killed the child, if any.
    pub const fn term_signal(&self) -> Option<SignalNumber> {
        if WIFSIGNALED(self.0) {
            Some(WTERMSIG(self.0))
        } else {
            None
        }
    }
}

impl fmt::Debug for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exit_status(), self.term_signal()) {
            (Some(code), _) => write!(f, "ExitStatus({code})"),
            (None, Some(signal)) => match signal_name(signal) {
                Some(name) => write!(f, "TermSignal({name})"),
                None => write!(f, "TermSignal({signal})"),
            },
            (None, None) => write!(f, "WaitStatus({:#x})", self.0),
        }
    }
}
