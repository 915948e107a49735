//! partmap - Partition map extraction for embedded-device dumps
//!
//! Reconstructs "what partitions exist, where do they sit, and what lands on
//! them" from a forensic dump of an embedded device:
//!
//! - the `sw-description` update descriptor states where update payloads are
//!   written (intent),
//! - a raw GPT or MBR image states the on-flash geometry (observation),
//! - `reconcile` merges the two into one keyed JSON report, with the
//!   descriptor leading and the table only decorating.
//!
//! Each step is also exposed on its own: `table` decodes a raw image into
//! keyed bounds, `show` renders a finished report for human reading.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Reconcile {
            dump_root,
            output,
            bounds_check,
        } => commands::reconcile::cmd_reconcile(&dump_root, &output, bounds_check.as_deref()),
        Commands::Table { input, output } => commands::table::cmd_table(&input, &output),
        Commands::Show { file } => commands::show::cmd_show(&file),
    }
}
