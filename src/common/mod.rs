#![forbid(unsafe_code)]

pub use command::{CommandSpec, MAX_ARGUMENTS};
pub use error::Error;

pub mod command;
pub mod error;
