use std::{
    fs::{File, OpenOptions},
    io,
    os::{
        fd::{AsRawFd, RawFd},
        unix::fs::OpenOptionsExt,
    },
    path::Path,
};

use crate::{
    common::CommandSpec,
    cutils::write_all_raw,
    log::dev_info,
    system::{clear_cloexec, close, dup2},
};

use super::Mode;

/// Where a background job reads from when it has no input redirection.
pub const NULL_DEVICE: &str = "/dev/null";

const OUTPUT_MODE: u32 = 0o644;

/// Open the target of a `>` redirection: write only, truncated, created with mode `0644`.
///
/// The descriptor is close-on-exec; only its duplicate on standard output survives `exec`.
pub fn resolve_output(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(path)
}

/// Open the source of a `<` redirection read only.
pub fn resolve_input(path: &Path) -> io::Result<File> {
    File::open(path)
}

#[derive(Clone, Copy)]
enum Direction {
    Input,
    Output,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }

    fn target(self) -> RawFd {
        match self {
            Direction::Input => libc::STDIN_FILENO,
            Direction::Output => libc::STDOUT_FILENO,
        }
    }

    fn failure(self) -> &'static [u8] {
        match self {
            Direction::Input => b"smallsh: cannot redirect standard input\n",
            Direction::Output => b"smallsh: cannot redirect standard output\n",
        }
    }
}

/// What a standard stream of the child is bound to.
pub(crate) enum Binding {
    /// Keep the stream the shell has.
    Inherit,
    /// Rebind the stream to this file.
    File(File),
    /// The file could not be opened; the child reports this message and exits.
    Failed(Vec<u8>),
}

impl Binding {
    fn open(path: &Path, direction: Direction) -> Self {
        let opened = match direction {
            Direction::Input => resolve_input(path),
            Direction::Output => resolve_output(path),
        };

        match opened {
            Ok(file) => Binding::File(file),
            Err(err) => {
                dev_info!(
                    "cannot open {} for {}: {err}",
                    path.display(),
                    direction.as_str()
                );
                Binding::Failed(
                    format!(
                        "smallsh: cannot open {} for {}\n",
                        path.display(),
                        direction.as_str()
                    )
                    .into_bytes(),
                )
            }
        }
    }
}

/// The descriptors a child gets on standard input and output.
///
/// The parent owns the opened files; dropping this value after `fork` closes the parent's
/// copies.
pub(crate) struct Redirections {
    stdin: Binding,
    stdout: Binding,
}

impl Redirections {
    pub(crate) fn resolve(spec: &CommandSpec, mode: Mode) -> Self {
        let stdout = match spec.output_redirect() {
            Some(path) => Binding::open(path, Direction::Output),
            None => Binding::Inherit,
        };

        let stdin = match (spec.input_redirect(), mode) {
            (Some(path), _) => Binding::open(path, Direction::Input),
            (None, Mode::Background) => Binding::open(Path::new(NULL_DEVICE), Direction::Input),
            (None, Mode::Foreground) => Binding::Inherit,
        };

        Self { stdin, stdout }
    }

    fn bindings(&self) -> [(&Binding, Direction); 2] {
        [
            (&self.stdout, Direction::Output),
            (&self.stdin, Direction::Input),
        ]
    }

    /// Bind the standard streams of the current process. Only called in the child after
    /// `fork`, so it must stay async-signal-safe: no allocation, no locks.
    ///
    /// On failure the returned message should be written out before exiting.
    pub(crate) fn install(&self) -> Result<(), &[u8]> {
        // Report an unopenable file before touching any stream, so the message reaches the
        // shell's own standard output.
        for (binding, _) in self.bindings() {
            if let Binding::Failed(message) = binding {
                return Err(message.as_slice());
            }
        }

        for (binding, direction) in self.bindings() {
            if let Binding::File(file) = binding {
                let source = file.as_raw_fd();
                let target = direction.target();
                if source == target {
                    // the shell started with this stream closed and the file took its slot,
                    // still marked close-on-exec
                    clear_cloexec(target).map_err(|_| direction.failure())?;
                    continue;
                }
                dup2(source, target).map_err(|_| direction.failure())?;
                // the duplicate is all the child needs
                let _ = close(source);
            }
        }

        Ok(())
    }
}

/// Install the redirections in a freshly forked child, or report and exit.
pub(crate) fn install_or_exit(redirections: &Redirections) {
    if let Err(message) = redirections.install() {
        write_all_raw(libc::STDOUT_FILENO, message);
        crate::system::_exit(1);
    }
}
