//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "partmap")]
#[command(author, version, about = "Partition map extraction from embedded-device dumps", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a dump's update descriptor into a partition map report
    Reconcile {
        /// Dump directory to scan for sw-description
        dump_root: PathBuf,

        /// Report JSON output path
        output: PathBuf,

        /// Keyed bounds JSON to cross-check LBA ranges against
        bounds_check: Option<PathBuf>,
    },

    /// Decode a raw partition table image into keyed bounds JSON
    Table {
        /// Image file, or a dump directory to search for table candidates
        input: PathBuf,

        /// Bounds JSON output path
        output: PathBuf,
    },

    /// Summarize a previously written partition map report
    Show {
        /// Report JSON to read
        file: PathBuf,
    },
}
