//! GPT (GUID Partition Table) decoding
//!
//! The header lives in LBA 1 (byte offset 512) and points at the entry
//! array, usually LBA 2. Only the fields needed to enumerate partitions are
//! read; CRCs are deliberately not checked so that partially damaged dumps
//! still yield their layout.
//!
//! Reference: UEFI specification 2.10, section 5.3.

use log::debug;

use super::types::{EntryKind, PartitionTable, TableEntry, UnrecognizedReason, SECTOR_SIZE};

/// GPT signature, at the start of the header
const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
/// Byte offset of the header (LBA 1)
const HEADER_OFFSET: usize = 512;
/// Field offsets relative to the header start
const ENTRIES_LBA_OFFSET: usize = 72;
const ENTRY_COUNT_OFFSET: usize = 80;
const ENTRY_SIZE_OFFSET: usize = 84;
/// Smallest entry size that holds every field we read (name ends at 128)
const MIN_ENTRY_SIZE: u64 = 128;
/// UTF-16LE name field within an entry
const NAME_OFFSET: usize = 56;
const NAME_LEN: usize = 72;

/// Whether the buffer carries the GPT signature at LBA 1.
pub(crate) fn has_gpt_signature(data: &[u8]) -> bool {
    data.len() >= HEADER_OFFSET + GPT_SIGNATURE.len()
        && &data[HEADER_OFFSET..HEADER_OFFSET + GPT_SIGNATURE.len()] == GPT_SIGNATURE
}

/// Decode the GPT entry array from an image prefix.
///
/// Unused slots (all-zero type GUID) and corrupt slots (`last < first`) are
/// skipped. An entry array that does not fit the buffer is a hard stop:
/// partial entries are never decoded and there is no fallback to MBR.
pub(crate) fn decode_gpt(data: &[u8]) -> PartitionTable {
    if data.len() < HEADER_OFFSET + ENTRY_SIZE_OFFSET + 4 {
        return PartitionTable::Unrecognized(UnrecognizedReason::GptHeaderTruncated);
    }
    let header = &data[HEADER_OFFSET..];
    let entries_lba =
        u64::from_le_bytes(header[ENTRIES_LBA_OFFSET..ENTRIES_LBA_OFFSET + 8].try_into().unwrap());
    let entry_count =
        u32::from_le_bytes(header[ENTRY_COUNT_OFFSET..ENTRY_COUNT_OFFSET + 4].try_into().unwrap())
            as u64;
    let entry_size =
        u32::from_le_bytes(header[ENTRY_SIZE_OFFSET..ENTRY_SIZE_OFFSET + 4].try_into().unwrap())
            as u64;

    if entry_size < MIN_ENTRY_SIZE {
        debug!("GPT header declares entry size {}, below minimum", entry_size);
        return PartitionTable::Unrecognized(UnrecognizedReason::GptEntrySize);
    }

    // All header fields are untrusted; the extent math must not wrap.
    let extent = entries_lba
        .checked_mul(SECTOR_SIZE)
        .and_then(|offset| entry_count.checked_mul(entry_size).map(|len| (offset, len)))
        .and_then(|(offset, len)| offset.checked_add(len).map(|end| (offset, end)));
    let Some((entries_offset, end)) = extent else {
        return PartitionTable::Unrecognized(UnrecognizedReason::GptEntriesTruncated);
    };
    if end > data.len() as u64 {
        debug!(
            "GPT entry array needs {} bytes but buffer holds {}",
            end,
            data.len()
        );
        return PartitionTable::Unrecognized(UnrecognizedReason::GptEntriesTruncated);
    }

    let entries_offset = entries_offset as usize;
    let entry_size = entry_size as usize;
    let mut entries = Vec::new();
    for index in 0..entry_count as usize {
        let offset = entries_offset + index * entry_size;
        let entry = &data[offset..offset + entry_size];

        let type_guid: [u8; 16] = entry[..16].try_into().unwrap();
        if type_guid.iter().all(|&b| b == 0) {
            continue; // unused slot
        }
        let first_lba = u64::from_le_bytes(entry[32..40].try_into().unwrap());
        let last_lba = u64::from_le_bytes(entry[40..48].try_into().unwrap());
        if last_lba < first_lba {
            debug!("GPT slot {} has inverted range {}..{}", index, first_lba, last_lba);
            continue;
        }
        let Some(size_bytes) = (last_lba - first_lba)
            .checked_add(1)
            .and_then(|sectors| sectors.checked_mul(SECTOR_SIZE))
        else {
            debug!("GPT slot {} size overflows, skipping", index);
            continue;
        };

        let mut name = decode_utf16le_name(&entry[NAME_OFFSET..NAME_OFFSET + NAME_LEN]);
        if name.is_empty() {
            name = format!("gpt{}", index);
        }

        entries.push(TableEntry {
            name,
            first_lba,
            last_lba,
            size_bytes,
            kind: EntryKind::Gpt { type_guid },
        });
    }

    PartitionTable::Gpt(entries)
}

/// Decode the fixed-width UTF-16LE name field, stopping at the first null
/// code unit. Non-ASCII code units are replaced with `?`.
fn decode_utf16le_name(bytes: &[u8]) -> String {
    let mut name = String::new();
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        if unit == 0 {
            break;
        }
        if unit < 128 {
            name.push(unit as u8 as char);
        } else {
            name.push('?');
        }
    }
    name
}
