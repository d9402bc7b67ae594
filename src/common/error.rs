use crate::system::interface::ProcessId;
use std::{fmt, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    EmptyCommand,
    InvalidArgument(String),
    Fork(std::io::Error),
    Signal(std::io::Error),
    Wait(ProcessId, std::io::Error),
    Io(Option<PathBuf>, std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyCommand => f.write_str("no command given"),
            Error::InvalidArgument(arg) => write!(f, "invalid argument: {arg:?}"),
            Error::Fork(e) => write!(f, "cannot create process: {e}"),
            Error::Signal(e) => write!(f, "cannot set up signal handling: {e}"),
            Error::Wait(pid, e) => write!(f, "cannot wait for process {pid}: {e}"),
            Error::Io(location, e) => {
                if let Some(path) = location {
                    write!(f, "{}: {e}", path.display())
                } else {
                    write!(f, "IO error: {e}")
                }
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(None, err)
    }
}
