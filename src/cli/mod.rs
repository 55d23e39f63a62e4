//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes defining commands, parsing arguments, prompting in the interactive
//! menu and rendering reports for the terminal.

mod commands;
mod prompts;
mod report;

pub use commands::*;
pub use prompts::*;
