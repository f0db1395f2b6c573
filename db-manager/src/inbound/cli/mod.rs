//! Text front end for operators.
//!
//! [`Command`] parses one input line; [`CommandLoop`] drives the prompt,
//! executes commands against the decorated repository and renders results.

mod command;
mod runner;

pub use command::{Command, CommandError};
pub use runner::{CommandLoop, LoopExit};
