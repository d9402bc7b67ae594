use std::ffi::CString;

use crate::{
    common::{CommandSpec, Error},
    cutils::{to_cstring, write_all_raw},
    log::{dev_info, dev_warn},
    system::{
        _exit, argv_pointers, execvp, fork,
        interface::ProcessId,
        signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalSet},
        ForkResult,
    },
};

use super::{
    redirect::{install_or_exit, Redirections},
    Mode,
};

/// A child process started by [`launch`].
#[derive(Debug)]
pub struct LaunchedProcess {
    pub pid: ProcessId,
    pub mode: Mode,
}

/// Start `spec` as a new process.
///
/// Redirection targets are opened here, in the shell. If one cannot be opened the child is
/// still created: it reports the failure on standard output and exits with status 1, so the
/// shell observes it as an ordinary exit status. The shell's copies of the opened files are
/// closed before this function returns, whether or not `fork` succeeded.
pub fn launch(spec: &CommandSpec, mode: Mode) -> Result<LaunchedProcess, Error> {
    if spec.is_empty() {
        return Err(Error::EmptyCommand);
    }

    // The child must not allocate, so everything it needs is prepared up front.
    let args = spec
        .arguments()
        .iter()
        .map(|arg| to_cstring(arg).map_err(|_| Error::InvalidArgument(arg.clone())))
        .collect::<Result<Vec<CString>, Error>>()?;
    let argv = argv_pointers(&args);
    let not_found = format!("{}: no such file or directory\n", spec.program()).into_bytes();
    let sigchld = SignalSet::single(SIGCHLD).map_err(Error::Signal)?;

    let redirections = Redirections::resolve(spec, mode);

    #[allow(unsafe_code)]
    // SAFETY: the child branch only calls async-signal-safe functions before `exec`/`_exit`.
    let fork_result = unsafe { fork() };

    let ForkResult::Parent(pid) = fork_result.map_err(|err| {
        dev_warn!("unable to fork {}: {err}", spec.program());
        Error::Fork(err)
    })?
    else {
        exec_child(&argv, &redirections, &sigchld, mode, &not_found)
    };

    // The child has its own duplicates now.
    drop(redirections);

    dev_info!("launched `{spec}` with pid {pid} ({mode:?})");

    Ok(LaunchedProcess { pid, mode })
}

fn exec_child(
    argv: &[*const libc::c_char],
    redirections: &Redirections,
    sigchld: &SignalSet,
    mode: Mode,
    not_found: &[u8],
) -> ! {
    // The shell blocks SIGCHLD while it waits for a foreground job; the mask survives `exec`.
    let _ = sigchld.unblock();

    // The Rust runtime ignores SIGPIPE in the shell; programs expect the default.
    if let Ok(handler) = SignalHandler::register(SIGPIPE, SignalHandlerBehavior::Default) {
        handler.forget();
    }

    // Only a foreground job may be interrupted from the terminal. A background job keeps the
    // ignored SIGINT it inherited from the shell.
    if mode == Mode::Foreground {
        if let Ok(handler) = SignalHandler::register(SIGINT, SignalHandlerBehavior::Default) {
            handler.forget();
        }
    }

    install_or_exit(redirections);

    let _ = execvp(argv);

    write_all_raw(libc::STDOUT_FILENO, not_found);
    _exit(1)
}
