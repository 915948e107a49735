//! partmap-core - Core library for partition map extraction
//!
//! Reconstructs the storage layout of an embedded device from a forensic
//! dump. Two inputs carry layout information: the `sw-description` update
//! descriptor, which states where update payloads are written, and raw
//! partition table images (GPT or legacy MBR), which state where partitions
//! sit on flash. The descriptor leads; decoded table bounds only decorate
//! the records it produces.
//!
//! # Example
//!
//! ```ignore
//! use partmap_core::{dump, reconcile, swdesc};
//!
//! let root = std::path::Path::new("/dumps/device1");
//! let descriptor = dump::find_descriptor(root).expect("no sw-description");
//! let text = swdesc::read_descriptor_file(&descriptor)?;
//! let scan = swdesc::parse_descriptor(&text);
//! let merged = reconcile::reconcile(&scan.blocks, None);
//! println!("{} partitions", merged.partitions.len());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bounds;
pub mod classify;
pub mod dump;
pub mod error;
pub mod reconcile;
pub mod report;
pub mod swdesc;
pub mod table;

pub use error::{Error, Result};
