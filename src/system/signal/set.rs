use crate::{cutils::cerr, system::make_zeroed_sigaction};

use super::{handler::SignalHandlerBehavior, SignalNumber};

use std::{io, mem::MaybeUninit};

#[repr(transparent)]
pub(super) struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    pub(super) fn new(behavior: SignalHandlerBehavior) -> io::Result<Self> {
        // Slow system calls such as the shell's blocking `read` on its standard input are
        // restarted instead of failing with `EINTR` when a handler runs.
        let sa_flags = libc::SA_RESTART;

        // A callback gets a full `sa_mask` so it is never interrupted by another handler while
        // it runs.
        let (sa_sigaction, sa_mask) = match behavior {
            SignalHandlerBehavior::Default => (libc::SIG_DFL, SignalSet::empty()?),
            SignalHandlerBehavior::Ignore => (libc::SIG_IGN, SignalSet::empty()?),
            SignalHandlerBehavior::Handle(callback) => {
                (callback as libc::sighandler_t, SignalSet::full()?)
            }
        };

        let mut raw: libc::sigaction = make_zeroed_sigaction();
        raw.sa_sigaction = sa_sigaction;
        raw.sa_mask = sa_mask.raw;
        raw.sa_flags = sa_flags;

        Ok(Self { raw })
    }

    pub(super) fn register(&self, signal: SignalNumber) -> io::Result<Self> {
        let mut original_action = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigaction(signal, &self.raw, original_action.as_mut_ptr().cast()) })?;

        Ok(unsafe { original_action.assume_init() })
    }
}

// A signal set that can be used to mask signals.
#[repr(transparent)]
pub(crate) struct SignalSet {
    raw: libc::sigset_t,
}

impl SignalSet {
    /// Create an empty set.
    pub(crate) fn empty() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigemptyset(set.as_mut_ptr().cast()) })?;

        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing all the signals.
    pub(crate) fn full() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigfillset(set.as_mut_ptr().cast()) })?;

        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing only the given signal.
    pub(crate) fn single(signal: SignalNumber) -> io::Result<Self> {
        let mut set = Self::empty()?;

        cerr(unsafe { libc::sigaddset(&mut set.raw, signal) })?;

        Ok(set)
    }

    /// Returns `true` if the signal is a member of this set.
    #[cfg(test)]
    pub(crate) fn contains(&self, signal: SignalNumber) -> io::Result<bool> {
        cerr(unsafe { libc::sigismember(&self.raw, signal) }).map(|res| res == 1)
    }

    fn sigprocmask(&self, how: libc::c_int) -> io::Result<Self> {
        let mut original_set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigprocmask(how, &self.raw, original_set.as_mut_ptr().cast()) })?;

        Ok(unsafe { original_set.assume_init() })
    }

    /// Block all the signals in this set and return the previous set of blocked signals.
    ///
    /// After calling this function successfully, the set of blocked signals will be the union of
    /// the previous set of blocked signals and this set.
    pub(crate) fn block(&self) -> io::Result<Self> {
        self.sigprocmask(libc::SIG_BLOCK)
    }

    /// Unblock all the signals in this set and return the previous set of blocked signals.
    ///
    /// Async-signal-safe.
    pub(crate) fn unblock(&self) -> io::Result<Self> {
        self.sigprocmask(libc::SIG_UNBLOCK)
    }

    /// Block only the signals that are in this set and return the previous set of blocked signals.
    ///
    /// After calling this function successfully, the set of blocked signals will be the exactly
    /// this set.
    pub(crate) fn set_mask(&self) -> io::Result<Self> {
        self.sigprocmask(libc::SIG_SETMASK)
    }
}

#[cfg(test)]
mod tests {
    use super::SignalSet;
    use crate::system::signal::consts::*;

    #[test]
    fn single_contains_only_its_signal() {
        let set = SignalSet::single(SIGCHLD).unwrap();
        assert!(set.contains(SIGCHLD).unwrap());
        assert!(!set.contains(SIGINT).unwrap());

        assert!(!SignalSet::empty().unwrap().contains(SIGCHLD).unwrap());
        assert!(SignalSet::full().unwrap().contains(SIGINT).unwrap());
    }

    #[test]
    fn block_then_restore_mask() {
        let original = SignalSet::single(SIGCHLD).unwrap().block().unwrap();
        let while_blocked = original.set_mask().unwrap();
        assert!(while_blocked.contains(SIGCHLD).unwrap());

        let current = SignalSet::empty().unwrap().block().unwrap();
        assert_eq!(
            current.contains(SIGCHLD).unwrap(),
            original.contains(SIGCHLD).unwrap()
        );
    }

    #[test]
    fn unblock_removes_from_mask() {
        let original = SignalSet::single(SIGUSR1).unwrap().block().unwrap();

        let while_blocked = SignalSet::single(SIGUSR1).unwrap().unblock().unwrap();
        assert!(while_blocked.contains(SIGUSR1).unwrap());

        let after = SignalSet::empty().unwrap().block().unwrap();
        assert!(!after.contains(SIGUSR1).unwrap());

        original.set_mask().unwrap();
    }
}
