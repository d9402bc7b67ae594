//! Collects terminated background jobs from a SIGCHLD handler.
//!
//! Everything reachable from [`on_sigchld`] runs in signal context, interrupting arbitrary
//! shell code, a foreground wait included. It must not allocate, lock, or use buffered
//! output: notices are laid out in a fixed stack buffer and written with a single `write(2)`.
use std::{
    io,
    os::fd::RawFd,
    sync::atomic::{AtomicBool, AtomicI32, Ordering},
};

use crate::{
    cutils::{errno, set_errno, write_all_raw},
    log::{dev_info, dev_warn},
    system::{
        interface::ProcessId,
        signal::{consts::SIGCHLD, SignalHandler, SignalHandlerBehavior, SignalNumber, SignalSet},
        wait::{next_terminated, Wait, WaitOptions},
    },
};

use super::TerminationStatus;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// The child the foreground supervisor is waiting for; 0 when there is none.
static FOREGROUND: AtomicI32 = AtomicI32::new(0);

/// Register the reaper for SIGCHLD for the rest of the process lifetime.
///
/// Must be called once, before the first background job is launched.
pub fn install() -> io::Result<()> {
    SignalHandler::register(SIGCHLD, SignalHandlerBehavior::Handle(on_sigchld))?.forget();
    INSTALLED.store(true, Ordering::SeqCst);
    dev_info!("background reaper installed");
    Ok(())
}

/// Leave `pid` to the foreground supervisor. It has to be set before the child can be
/// observed as terminated, so SIGCHLD must be blocked from `fork` until this call.
pub(crate) fn set_foreground(pid: Option<ProcessId>) {
    FOREGROUND.store(pid.map_or(0, |pid| pid.get()), Ordering::SeqCst);
}

/// Report background jobs that terminated while the reaper was holding back for the
/// foreground child. Does nothing unless the reaper is installed.
pub(crate) fn report_pending() {
    if !INSTALLED.load(Ordering::SeqCst) {
        return;
    }

    let original_mask = match SignalSet::single(SIGCHLD).and_then(|set| set.block()) {
        Ok(mask) => mask,
        Err(err) => {
            dev_warn!("cannot block SIGCHLD: {err}");
            return;
        }
    };

    reap_finished(libc::STDOUT_FILENO);

    if let Err(err) = original_mask.set_mask() {
        dev_warn!("cannot restore signal mask: {err}");
    }
}

extern "C" fn on_sigchld(_signal: SignalNumber) {
    let saved_errno = errno();
    reap_finished(libc::STDOUT_FILENO);
    set_errno(saved_errno);
}

/// Collect every child that has terminated so far and write a notice for each to `fd`.
///
/// Deliveries of SIGCHLD coalesce, so one call has to drain all of them. Stops at the
/// foreground child without collecting it. Returns the number of children collected.
pub(crate) fn reap_finished(fd: RawFd) -> usize {
    let mut reaped = 0;

    loop {
        let pid = match next_terminated() {
            Ok(pid) => pid,
            Err(err) if err.is_interrupted() => continue,
            // nothing left: either no child has finished or there are no children at all
            Err(_) => break,
        };

        if pid.get() == FOREGROUND.load(Ordering::SeqCst) {
            break;
        }

        match pid.wait(WaitOptions::new().no_hang()) {
            Ok((pid, status)) => {
                if let Some(status) = TerminationStatus::from_wait_status(&status) {
                    write_all_raw(fd, Notice::new(pid, status).as_bytes());
                    reaped += 1;
                }
            }
            Err(err) if err.is_interrupted() => {}
            Err(_) => break,
        }
    }

    reaped
}

const NOTICE_CAPACITY: usize = 96;

/// A termination notice laid out in place.
///
/// `"\nbackground pid <pid> is done: exit value <code>\n"` or
/// `"\nbackground pid <pid> is done: terminated by signal <n>\n"`
pub(crate) struct Notice {
    buf: [u8; NOTICE_CAPACITY],
    len: usize,
}

impl Notice {
    pub(crate) fn new(pid: ProcessId, status: TerminationStatus) -> Self {
        let mut notice = Notice {
            buf: [0; NOTICE_CAPACITY],
            len: 0,
        };

        notice.push(b"\nbackground pid ");
        notice.push_int(pid.get().into());
        notice.push(b" is done: ");
        match status {
            TerminationStatus::ExitedNormally(code) => {
                notice.push(b"exit value ");
                notice.push_int(code.into());
            }
            TerminationStatus::KilledBySignal(signal) => {
                notice.push(b"terminated by signal ");
                notice.push_int(signal.into());
            }
        }
        notice.push(b"\n");

        notice
    }

    // truncates instead of panicking; the longest notice fits comfortably
    fn push(&mut self, bytes: &[u8]) {
        let available = NOTICE_CAPACITY - self.len;
        let count = bytes.len().min(available);
        self.buf[self.len..self.len + count].copy_from_slice(&bytes[..count]);
        self.len += count;
    }

    fn push_int(&mut self, value: i64) {
        // i64::MIN has 19 digits plus the sign
        let mut digits = [0u8; 20];
        let mut position = digits.len();
        let mut magnitude = value.unsigned_abs();

        loop {
            position -= 1;
            digits[position] = b'0' + (magnitude % 10) as u8;
            magnitude /= 10;
            if magnitude == 0 {
                break;
            }
        }
        if value < 0 {
            position -= 1;
            digits[position] = b'-';
        }

        self.push(&digits[position..]);
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}
