use std::{
    io::{self, BufRead},
    path::PathBuf,
    process,
};

use crate::{
    common::{CommandSpec, Error},
    cutils::to_cstring,
    exec::{launch_background, reaper, run_foreground},
    log::{dev_info, user_error, ShellLogger},
    system::{
        chdir,
        signal::{consts::SIGINT, SignalHandler, SignalHandlerBehavior},
    },
};

use cli::{ShellAction, ShellOptions};
use help::{long_help_message, USAGE_MSG};
use status::LastStatus;

mod cli;
mod help;
mod status;

const PROMPT: &str = ": ";
const VERSION: &str = env!("CARGO_PKG_VERSION");

enum Builtin<'a> {
    Exit,
    Cd(Option<&'a str>),
    Status,
}

impl<'a> Builtin<'a> {
    fn parse(spec: &'a CommandSpec) -> Option<Self> {
        match spec.program() {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd(spec.arguments().get(1).map(String::as_str))),
            "status" => Some(Builtin::Status),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Exit,
}

fn is_ignored(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with('#')
}

fn change_directory(target: Option<&str>) -> Result<(), Error> {
    let directory = match target {
        Some(directory) => PathBuf::from(directory),
        None => std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
            Error::Io(None, io::Error::new(io::ErrorKind::NotFound, "HOME not set"))
        })?,
    };

    let path = to_cstring(&directory)?;
    chdir(&path).map_err(|err| Error::Io(Some(directory), err))
}

#[derive(Default)]
struct Shell {
    last: LastStatus,
}

impl Shell {
    fn run(&mut self, mut input: impl BufRead) -> io::Result<()> {
        let mut line = String::new();

        loop {
            print_flush_ignore_io_error!("{PROMPT}");

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    user_error!("ignoring line: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            }

            if self.execute(&line) == Flow::Exit {
                return Ok(());
            }
        }
    }

    fn execute(&mut self, line: &str) -> Flow {
        if is_ignored(line) {
            return Flow::Continue;
        }

        let spec = CommandSpec::parse(line);
        if spec.is_empty() {
            return Flow::Continue;
        }

        match Builtin::parse(&spec) {
            Some(Builtin::Exit) => return Flow::Exit,
            Some(Builtin::Cd(target)) => {
                if let Err(error) = change_directory(target) {
                    user_error!("cd: {error}");
                }
            }
            Some(Builtin::Status) => println_ignore_io_error!("{}", self.last.report()),
            None if spec.is_background() => match launch_background(&spec) {
                Ok(pid) => {
                    println_ignore_io_error!("background pid {pid}");
                    self.last.reset();
                }
                Err(error) => self.fail(error),
            },
            None => match run_foreground(&spec) {
                Ok(outcome) => {
                    if let Some(message) = &outcome.message {
                        println_ignore_io_error!("{message}");
                    }
                    self.last.record(outcome);
                }
                Err(error) => self.fail(error),
            },
        }

        Flow::Continue
    }

    fn fail(&mut self, error: Error) {
        user_error!("{error}");
        self.last.record_failure(error.to_string());
    }
}

fn run() -> Result<(), Error> {
    // only foreground children may be interrupted from the terminal
    SignalHandler::register(SIGINT, SignalHandlerBehavior::Ignore)
        .map_err(Error::Signal)?
        .forget();
    reaper::install().map_err(Error::Signal)?;

    dev_info!("smallsh {VERSION} started");

    Shell::default().run(io::stdin().lock())?;

    Ok(())
}

pub fn main() {
    ShellLogger::new("smallsh: ").into_global_logger();

    let options = match ShellOptions::from_env() {
        Ok(options) => options,
        Err(error) => {
            eprintln_ignore_io_error!("smallsh: {error}\n{USAGE_MSG}");
            process::exit(1);
        }
    };

    match options.action {
        ShellAction::Help => {
            println_ignore_io_error!("{}", long_help_message());
            process::exit(0);
        }
        ShellAction::Version => {
            println_ignore_io_error!("smallsh {VERSION}");
            process::exit(0);
        }
        ShellAction::Run => {
            if let Err(error) = run() {
                eprintln_ignore_io_error!("smallsh: {error}");
                process::exit(1);
            }
            process::exit(0);
        }
    }
}
