//! CLI module for depositum
//!
//! Offline inspection of a repository snapshot:
//! - validate: Load a snapshot and check every work against its invariants
//! - resolve: Print the representative version of a work
//! - access: Print the grants and effective access on a work
//! - check-config: Load and validate a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{access, check_config, resolve, run, run_command, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
