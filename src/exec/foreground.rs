use crate::{
    common::{CommandSpec, Error},
    log::{dev_info, dev_warn},
    system::{
        interface::ProcessId,
        signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalSet},
        wait::{Wait, WaitError, WaitOptions},
    },
};

use super::{launch, reaper, LaunchedProcess, Mode, TerminationStatus};

/// The result of a foreground command, for the caller to store as its last status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundOutcome {
    pub status: TerminationStatus,
    /// Set when the command was killed by a signal; meant to be printed right away and
    /// reported by later status queries instead of the exit value.
    pub message: Option<String>,
}

impl From<TerminationStatus> for ForegroundOutcome {
    fn from(status: TerminationStatus) -> Self {
        let message = match status {
            TerminationStatus::KilledBySignal(_) => Some(status.to_string()),
            TerminationStatus::ExitedNormally(_) => None,
        };

        Self { status, message }
    }
}

/// Run `spec` and block until it terminates.
///
/// The background reaper keeps running during the wait and reports other jobs as they
/// finish; it only leaves this child alone. SIGINT is ignored by the shell while it waits,
/// the child gets the default action.
pub fn run_foreground(spec: &CommandSpec) -> Result<ForegroundOutcome, Error> {
    let _sigint = SignalHandler::register(SIGINT, SignalHandlerBehavior::Ignore)
        .map_err(Error::Signal)?;

    let process = launch_supervised(spec)?;
    let status = wait_for(process.pid);

    reaper::set_foreground(None);
    // jobs that finished while the reaper was holding back for this child
    reaper::report_pending();

    let status = status?;
    dev_info!("foreground pid {} finished: {status}", process.pid);

    Ok(status.into())
}

// SIGCHLD stays blocked until the reaper knows the pid, otherwise a child that terminates
// right away would be reported as a background job.
fn launch_supervised(spec: &CommandSpec) -> Result<LaunchedProcess, Error> {
    let original_mask = SignalSet::single(SIGCHLD)
        .and_then(|set| set.block())
        .map_err(Error::Signal)?;

    let result = launch(spec, Mode::Foreground);
    if let Ok(process) = &result {
        reaper::set_foreground(Some(process.pid));
    }

    if let Err(err) = original_mask.set_mask() {
        dev_warn!("cannot restore signal mask: {err}");
    }

    result
}

fn wait_for(pid: ProcessId) -> Result<TerminationStatus, Error> {
    loop {
        match pid.wait(WaitOptions::new()) {
            Ok((_, status)) => {
                if let Some(status) = TerminationStatus::from_wait_status(&status) {
                    return Ok(status);
                }
            }
            Err(err) if err.is_interrupted() => {}
            Err(WaitError::NotReady) => {}
            Err(WaitError::Io(err)) => return Err(Error::Wait(pid, err)),
        }
    }
}
