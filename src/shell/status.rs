use crate::exec::{ForegroundOutcome, TerminationStatus};

/// What the `status` built-in reports: the outcome of the last foreground command.
///
/// Reading it does not change it; only the next command does.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct LastStatus {
    status: TerminationStatus,
    message: Option<String>,
}

impl LastStatus {
    pub(crate) fn record(&mut self, outcome: ForegroundOutcome) {
        self.status = outcome.status;
        self.message = outcome.message;
    }

    /// The command could not be started at all.
    pub(crate) fn record_failure(&mut self, message: String) {
        self.status = TerminationStatus::ExitedNormally(1);
        self.message = Some(message);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn report(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::LastStatus;
    use crate::exec::{ForegroundOutcome, TerminationStatus};

    #[test]
    fn starts_as_success() {
        assert_eq!(LastStatus::default().report(), "exit value 0");
    }

    #[test]
    fn report_is_repeatable() {
        let mut last = LastStatus::default();
        last.record(TerminationStatus::ExitedNormally(2).into());
        assert_eq!(last.report(), "exit value 2");
        assert_eq!(last.report(), "exit value 2");
    }

    #[test]
    fn signal_message_supersedes_until_next_command() {
        let mut last = LastStatus::default();
        last.record(TerminationStatus::KilledBySignal(libc::SIGINT).into());
        assert_eq!(
            last.report(),
            format!("terminated by signal {}", libc::SIGINT)
        );

        last.record(ForegroundOutcome::from(TerminationStatus::ExitedNormally(0)));
        assert_eq!(last.report(), "exit value 0");
    }

    #[test]
    fn failures_and_reset() {
        let mut last = LastStatus::default();
        last.record_failure("cannot create process: out of memory".into());
        assert_eq!(last.report(), "cannot create process: out of memory");

        last.reset();
        assert_eq!(last, LastStatus::default());
    }
}
