//! Terminal front end for quizcast.
//!
//! A thin shell over [`quizcast_app::Driver`]: [`TerminalDriver`] reads slash
//! commands from stdin and prints state changes to stdout. All orchestration
//! lives in the runtimes of `quizcast-app`. The goal and daily-task
//! subcommands in [`tracker`] are one-shot REST calls.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod report;
pub mod terminal;
pub mod tracker;

pub use cli::{Cli, CliCommand, QuizzesCommand, run};
pub use commands::Input;
pub use error::CliError;
pub use terminal::{TerminalDriver, TerminalError};
pub use tracker::{GoalsCommand, SubtasksCommand, TasksCommand};
