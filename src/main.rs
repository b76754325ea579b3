//! depositum CLI entry point
//!
//! Parses nothing and loads nothing itself. All logic is delegated to
//! `cli::run`; errors go to stderr with a non-zero exit.

use depositum::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
