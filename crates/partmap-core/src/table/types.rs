//! Partition table types
//!
//! Core types shared by the MBR and GPT decoders. Entries are plain decoded
//! values; nothing here touches the filesystem.

use std::fmt;

/// Number of bytes per logical block (LBA granularity).
pub const SECTOR_SIZE: u64 = 512;

/// A single partition entry decoded from an on-disk table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Decoded or synthesized entry name (`gpt<n>`/`mbr<n>` when unnamed)
    pub name: String,
    /// First logical block of the partition (inclusive)
    pub first_lba: u64,
    /// Last logical block of the partition (inclusive)
    pub last_lba: u64,
    /// Partition size in bytes, `(last - first + 1) * SECTOR_SIZE`
    pub size_bytes: u64,
    /// Scheme-specific type information
    pub kind: EntryKind,
}

impl TableEntry {
    /// Render the scheme-specific type indicator for reports.
    pub fn type_indicator(&self) -> String {
        self.kind.indicator()
    }
}

/// Scheme-specific type information carried by a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Legacy MBR entry with its one-byte partition type
    Mbr {
        /// The raw type byte (e.g. 0x83 for Linux)
        type_byte: u8,
    },
    /// GPT entry with its 16-byte type GUID as stored on disk
    Gpt {
        /// Raw GUID bytes (mixed-endian on disk)
        type_guid: [u8; 16],
    },
}

impl EntryKind {
    /// Type indicator string: two hex digits for MBR, the mixed-endian GUID
    /// rendering for GPT.
    pub fn indicator(&self) -> String {
        match self {
            EntryKind::Mbr { type_byte } => format!("0x{:02x}", type_byte),
            EntryKind::Gpt { type_guid } => format_guid(type_guid),
        }
    }
}

/// Format a GPT GUID. The first three fields are stored little-endian on
/// disk; the remaining bytes are taken verbatim.
pub(crate) fn format_guid(g: &[u8; 16]) -> String {
    let d1 = u32::from_le_bytes([g[0], g[1], g[2], g[3]]);
    let d2 = u16::from_le_bytes([g[4], g[5]]);
    let d3 = u16::from_le_bytes([g[6], g[7]]);
    format!(
        "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        d1, d2, d3, g[8], g[9], g[10], g[11], g[12], g[13], g[14], g[15]
    )
}

/// Result of scanning an image prefix for a partition table.
///
/// Forensic input is untrusted: a buffer that cannot be interpreted yields
/// [`PartitionTable::Unrecognized`] with a reason, never an error or a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionTable {
    /// GUID partition table; entries in slot order
    Gpt(Vec<TableEntry>),
    /// Legacy MBR; entries in slot order
    Mbr(Vec<TableEntry>),
    /// Not a table this decoder understands
    Unrecognized(UnrecognizedReason),
}

impl PartitionTable {
    /// Decoded entries, empty for unrecognized buffers.
    pub fn entries(&self) -> &[TableEntry] {
        match self {
            PartitionTable::Gpt(entries) | PartitionTable::Mbr(entries) => entries,
            PartitionTable::Unrecognized(_) => &[],
        }
    }

    /// Scheme name used in report metadata.
    pub fn scheme(&self) -> &'static str {
        match self {
            PartitionTable::Gpt(_) => "gpt",
            PartitionTable::Mbr(_) => "mbr",
            PartitionTable::Unrecognized(_) => "unknown",
        }
    }

    /// Whether a table was decoded at all.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, PartitionTable::Unrecognized(_))
    }
}

/// Why a buffer was not interpreted as a partition table.
///
/// Diagnostic only: unrecognized input is an expected outcome on forensic
/// dumps, distinct from an engine fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnrecognizedReason {
    /// Buffer is shorter than one sector
    TooShort,
    /// No GPT signature and no MBR boot signature
    NoBootSignature,
    /// GPT signature present but the header does not fit the buffer
    GptHeaderTruncated,
    /// GPT entry array extends past the buffer (or its extent overflows)
    GptEntriesTruncated,
    /// GPT header declares an entry size too small to hold an entry
    GptEntrySize,
    /// Valid MBR boot signature but all four slots are empty
    EmptyMbr,
}

impl fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "buffer shorter than one sector"),
            Self::NoBootSignature => write!(f, "no GPT or MBR signature found"),
            Self::GptHeaderTruncated => write!(f, "GPT header truncated"),
            Self::GptEntriesTruncated => write!(f, "GPT entry array exceeds buffer"),
            Self::GptEntrySize => write!(f, "GPT entry size too small"),
            Self::EmptyMbr => write!(f, "MBR present but no populated entries"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_guid_mixed_endian() {
        // Linux filesystem data type GUID, byte order as stored on disk
        let raw: [u8; 16] = [
            0xaf, 0x3d, 0xc6, 0x0f, 0x83, 0x84, 0x72, 0x47, 0x8e, 0x79, 0x3d, 0x69, 0xd8, 0x47,
            0x7d, 0xe4,
        ];
        assert_eq!(format_guid(&raw), "0fc63daf-8483-4772-8e79-3d69d8477de4");
    }

    #[test]
    fn test_type_indicator() {
        let mbr = EntryKind::Mbr { type_byte: 0x83 };
        assert_eq!(mbr.indicator(), "0x83");

        let gpt = EntryKind::Gpt { type_guid: [0xff; 16] };
        assert_eq!(gpt.indicator(), "ffffffff-ffff-ffff-ffff-ffffffffffff");
    }

    #[test]
    fn test_unrecognized_has_no_entries() {
        let table = PartitionTable::Unrecognized(UnrecognizedReason::TooShort);
        assert!(table.entries().is_empty());
        assert!(!table.is_recognized());
        assert_eq!(table.scheme(), "unknown");
    }
}
