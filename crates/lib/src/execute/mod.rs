//! External command execution.
//!
//! Every shell-out in the pipeline (checksums, package build, signing,
//! database update) goes through [`run_command`], which enforces the optional
//! wall-clock limit and turns non-zero exits into errors.

mod cmd;
mod types;

pub use cmd::run_command;
pub use types::{CommandError, CommandOutput, CommandSpec};
