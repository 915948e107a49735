//! Error types for the extraction engine
//!
//! Malformed forensic input is not an error: unrecognized tables and dropped
//! descriptor blocks are ordinary outcomes reported in-band. Errors are
//! reserved for the environment failing us, such as unreadable files or a
//! cross-check document that is not JSON.

use std::io;
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Reading an input or writing a report failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A JSON document could not be parsed or produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
