//! Command-line interface for music-reconciler.
//!
//! Every stage of the reconcile workflow is a subcommand; stages hand their
//! results to each other through the session file.

mod commands;

pub use commands::{Cli, Commands, run_command};
