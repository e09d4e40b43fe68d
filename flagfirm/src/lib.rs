//! Command line front end for the flagfirm flag validator.

pub mod config;
pub mod error;

pub use config::{LayeredEnvironment, Settings};
pub use flagfirm_core::{Check, FlagValidator, Tool, ValidationOutcome};

/// Result of a subcommand: the process exit code and an optional message
/// printed to stderr.
#[derive(Debug, PartialEq, Eq)]
pub struct CmdExit {
    pub code: exitcode::ExitCode,
    pub message: Option<String>,
}
