use std::{
    ffi::{CStr, CString},
    io,
    os::fd::RawFd,
};

use crate::cutils::*;
use interface::ProcessId;

#[cfg(test)]
use self::signal::SignalNumber;

// generalized traits for when we want to hide implementations
pub mod interface;

pub mod signal;

pub mod wait;

pub(crate) fn _exit(status: libc::c_int) -> ! {
    unsafe { libc::_exit(status) }
}

pub(crate) enum ForkResult {
    // Parent process branch with the child process' PID.
    Parent(ProcessId),
    // Child process branch.
    Child,
}

/// Create a new process.
///
/// # Safety
///
/// In a multithreaded program, only async-signal-safe functions are guaranteed to work in the
/// child process until a call to `execve` or a similar function is done.
pub(crate) unsafe fn fork() -> io::Result<ForkResult> {
    let pid = cerr(unsafe { libc::fork() })?;
    if pid == 0 {
        Ok(ForkResult::Child)
    } else {
        Ok(ForkResult::Parent(ProcessId::new(pid)))
    }
}

/// Make `target` refer to the same open file description as `source`.
///
/// Async-signal-safe.
pub(crate) fn dup2(source: RawFd, target: RawFd) -> io::Result<()> {
    cerr(unsafe { libc::dup2(source, target) }).map(|_| ())
}

/// Keep `fd` open across `exec`.
///
/// Async-signal-safe.
pub(crate) fn clear_cloexec(fd: RawFd) -> io::Result<()> {
    cerr(unsafe { libc::fcntl(fd, libc::F_SETFD, 0) }).map(|_| ())
}

/// Close a raw file descriptor that is not owned by any Rust value.
///
/// Async-signal-safe.
pub(crate) fn close(fd: RawFd) -> io::Result<()> {
    cerr(unsafe { libc::close(fd) }).map(|_| ())
}

/// Replace the current process image, looking `argv[0]` up through `PATH`.
///
/// `argv` must be a null-terminated array of pointers into live C strings. This function only
/// returns on failure. Async-signal-safe as long as `argv` was built before `fork`.
pub(crate) fn execvp(argv: &[*const libc::c_char]) -> io::Error {
    debug_assert!(argv.last().is_some_and(|ptr| ptr.is_null()));
    unsafe { libc::execvp(argv[0], argv.as_ptr()) };
    io::Error::last_os_error()
}

/// Change the working directory of the current process.
pub(crate) fn chdir<S: AsRef<CStr>>(path: &S) -> io::Result<()> {
    let path = path.as_ref().as_ptr();

    cerr(unsafe { libc::chdir(path) }).map(|_| ())
}

/// Send a signal to a process with the specified ID.
#[cfg(test)]
pub fn kill(pid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::kill(pid.get(), signal) }).map(|_| ())
}

#[cfg(test)]
pub struct Process;

#[cfg(test)]
impl Process {
    /// Return the process identifier for the current process
    pub fn process_id() -> ProcessId {
        // NOTE libstd casts the `i32` that `libc::getpid` returns into `u32`
        // here we cast it back into `i32` (`ProcessId`)
        ProcessId::new(std::process::id() as libc::pid_t)
    }
}

/// Build the null-terminated pointer array `execvp` expects. The pointers borrow from `args`,
/// which must outlive every use of the returned vector.
pub(crate) fn argv_pointers(args: &[CString]) -> Vec<*const libc::c_char> {
    args.iter()
        .map(|arg| arg.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect()
}

pub fn make_zeroed_sigaction() -> libc::sigaction {
    // SAFETY: since sigaction is a C struct, all-zeroes is a valid representation
    // A struct literal cannot be used since the layout of libc::sigaction differs per platform
    unsafe { std::mem::zeroed() }
}
