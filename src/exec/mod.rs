#![deny(unsafe_code)]

mod foreground;
mod launch;
pub mod reaper;
pub mod redirect;
mod status;

use crate::{
    common::{CommandSpec, Error},
    system::interface::ProcessId,
};

pub use foreground::{run_foreground, ForegroundOutcome};
pub use launch::{launch, LaunchedProcess};
pub use redirect::{resolve_input, resolve_output};
pub use status::TerminationStatus;

/// How the shell tracks a launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The shell waits for the process before reading the next line.
    Foreground,
    /// The process is collected by the background reaper whenever it terminates.
    Background,
}

/// Start `spec` without waiting for it.
///
/// Its termination is reported asynchronously by the [`reaper`]; there is no immediate error
/// report for a program that cannot be run or a redirection that cannot be opened.
pub fn launch_background(spec: &CommandSpec) -> Result<ProcessId, Error> {
    launch(spec, Mode::Background).map(|process| process.pid)
}

#[cfg(test)]
pub(crate) fn scratch_path(name: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();

    std::env::temp_dir().join(format!(
        "smallsh_test_{name}_{}_{nanos}",
        std::process::id()
    ))
}
