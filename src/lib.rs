#[macro_use]
mod macros;
pub mod common;
pub(crate) mod cutils;
pub mod exec;
pub(crate) mod log;
pub(crate) mod system;

mod shell;

pub use common::{CommandSpec, Error};
pub use shell::main as smallsh_main;
pub use system::interface::ProcessId;
