//! On-disk partition table decoding
//!
//! Turns the prefix of a raw block-device image into a list of partition
//! entries. Two schemes are understood:
//!
//! - GPT, detected by the `EFI PART` signature at LBA 1
//! - legacy MBR, detected by the 0x55 0xAA boot signature
//!
//! Detection is ordered: a buffer carrying the GPT signature is decoded as
//! GPT only. A truncated or corrupt GPT never falls back to MBR, because a
//! protective MBR would then masquerade as the real layout.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

mod gpt;
mod mbr;
mod types;

pub use types::{EntryKind, PartitionTable, TableEntry, UnrecognizedReason, SECTOR_SIZE};

/// Largest image prefix ever materialized in memory. A GPT entry array on
/// embedded storage ends well inside the first megabyte; everything past
/// this bound is payload, not layout.
pub const MAX_IMAGE_PREFIX: u64 = 2 * 1024 * 1024;

impl PartitionTable {
    /// Decode a partition table from the prefix of a block-device image.
    ///
    /// Infallible by construction: anything that cannot be interpreted comes
    /// back as [`PartitionTable::Unrecognized`].
    pub fn decode(data: &[u8]) -> PartitionTable {
        if data.len() < SECTOR_SIZE as usize {
            return PartitionTable::Unrecognized(UnrecognizedReason::TooShort);
        }
        if gpt::has_gpt_signature(data) {
            gpt::decode_gpt(data)
        } else {
            mbr::decode_mbr(data)
        }
    }

    /// Decode a partition table from a file, reading at most
    /// [`MAX_IMAGE_PREFIX`] bytes.
    pub fn decode_file(path: impl AsRef<Path>) -> Result<PartitionTable> {
        let file = File::open(path)?;
        let mut data = Vec::new();
        file.take(MAX_IMAGE_PREFIX).read_to_end(&mut data)?;
        Ok(PartitionTable::decode(&data))
    }
}
