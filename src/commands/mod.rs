//! CLI command implementations
//!
//! Thin wrappers over `partmap-core`: locate inputs, run the engine, write
//! or print the result. Extraction policy lives in the core crate; anything
//! here is presentation and filesystem plumbing.

pub mod reconcile;
pub mod show;
pub mod table;

/// Format a byte count for human output.
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}
