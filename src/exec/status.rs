use std::fmt;

use crate::system::{signal::SignalNumber, wait::WaitStatus};

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    ExitedNormally(i32),
    KilledBySignal(SignalNumber),
}

impl TerminationStatus {
    /// Decode a raw wait status. Returns `None` if the child has not terminated (it was
    /// stopped or continued), which cannot be observed without `WUNTRACED`/`WCONTINUED`.
    ///
    /// Async-signal-safe.
    pub(crate) fn from_wait_status(status: &WaitStatus) -> Option<Self> {
        if let Some(code) = status.exit_status() {
            Some(Self::ExitedNormally(code))
        } else {
            status.term_signal().map(Self::KilledBySignal)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::ExitedNormally(0))
    }
}

impl Default for TerminationStatus {
    fn default() -> Self {
        Self::ExitedNormally(0)
    }
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitedNormally(code) => write!(f, "exit value {code}"),
            Self::KilledBySignal(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::system::{
        interface::ProcessId,
        kill,
        signal::consts::*,
        wait::{Wait, WaitOptions},
    };

    use super::TerminationStatus;

    fn status_of(mut command: std::process::Command) -> TerminationStatus {
        let child = command.spawn().unwrap();
        let (_, status) = ProcessId::new(child.id() as i32)
            .wait(WaitOptions::new())
            .unwrap();
        TerminationStatus::from_wait_status(&status).unwrap()
    }

    #[test]
    fn decodes_exit_codes() {
        let mut command = std::process::Command::new("sh");
        command.args(["-c", "exit 7"]);
        assert_eq!(status_of(command), TerminationStatus::ExitedNormally(7));
        assert!(status_of(std::process::Command::new("true")).is_success());
    }

    #[test]
    fn decodes_signals() {
        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();
        let pid = ProcessId::new(child.id() as i32);
        kill(pid, SIGTERM).unwrap();

        let (_, status) = pid.wait(WaitOptions::new()).unwrap();
        let decoded = TerminationStatus::from_wait_status(&status).unwrap();
        assert_eq!(decoded, TerminationStatus::KilledBySignal(SIGTERM));
        assert!(!decoded.is_success());
    }

    #[test]
    fn report_text() {
        assert_eq!(TerminationStatus::default().to_string(), "exit value 0");
        assert_eq!(
            TerminationStatus::ExitedNormally(1).to_string(),
            "exit value 1"
        );
        assert_eq!(
            TerminationStatus::KilledBySignal(15).to_string(),
            "terminated by signal 15"
        );
    }
}
