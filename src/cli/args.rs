//! CLI argument definitions using clap
//!
//! Commands:
//! - depositum validate --snapshot <path>
//! - depositum resolve --snapshot <path> --work <id>
//! - depositum access --snapshot <path> --work <id> [--user <id|uid>]
//! - depositum check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// depositum - versioned deposits with discover/read/edit access control
#[derive(Parser, Debug)]
#[command(name = "depositum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file. Defaults apply when absent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a snapshot and report what it contains
    Validate {
        /// Path to snapshot JSON
        #[arg(long)]
        snapshot: PathBuf,
    },

    /// Resolve the representative version of a work
    Resolve {
        /// Path to snapshot JSON
        #[arg(long)]
        snapshot: PathBuf,

        /// Work id
        #[arg(long)]
        work: Uuid,
    },

    /// Show grants and effective access on a work
    Access {
        /// Path to snapshot JSON
        #[arg(long)]
        snapshot: PathBuf,

        /// Work id
        #[arg(long)]
        work: Uuid,

        /// User id or uid. Anonymous when absent.
        #[arg(long)]
        user: Option<String>,
    },

    /// Load and validate a configuration file
    CheckConfig,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
