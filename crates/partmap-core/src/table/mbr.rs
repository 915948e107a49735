//! Legacy MBR decoding
//!
//! Reads the four primary slots of the classic partition table in the first
//! sector. Extended partitions are not chased; embedded devices that still
//! use MBR put everything in the primary slots.

use log::debug;

use super::types::{EntryKind, PartitionTable, TableEntry, UnrecognizedReason, SECTOR_SIZE};

/// Offset of the 0x55 0xAA boot signature
const BOOT_SIG_OFFSET: usize = 510;
/// Offset of the first partition slot
const TABLE_OFFSET: usize = 0x1be;
const SLOT_SIZE: usize = 16;
const SLOT_COUNT: usize = 4;

/// Decode the primary MBR slots from an image prefix.
///
/// Slots with a zero type byte or a zero sector count are skipped. A sector
/// with a valid boot signature but no populated slot is reported as
/// unrecognized rather than as an empty table.
pub(crate) fn decode_mbr(data: &[u8]) -> PartitionTable {
    if data.len() < BOOT_SIG_OFFSET + 2 {
        return PartitionTable::Unrecognized(UnrecognizedReason::TooShort);
    }
    if data[BOOT_SIG_OFFSET] != 0x55 || data[BOOT_SIG_OFFSET + 1] != 0xaa {
        return PartitionTable::Unrecognized(UnrecognizedReason::NoBootSignature);
    }

    let mut entries = Vec::new();
    for index in 0..SLOT_COUNT {
        let offset = TABLE_OFFSET + index * SLOT_SIZE;
        let slot = &data[offset..offset + SLOT_SIZE];

        let type_byte = slot[4];
        let first_lba = u32::from_le_bytes(slot[8..12].try_into().unwrap()) as u64;
        let sectors = u32::from_le_bytes(slot[12..16].try_into().unwrap()) as u64;
        if type_byte == 0 || sectors == 0 {
            continue;
        }

        entries.push(TableEntry {
            name: format!("mbr{}", index),
            first_lba,
            last_lba: first_lba + sectors - 1,
            size_bytes: sectors * SECTOR_SIZE,
            kind: EntryKind::Mbr { type_byte },
        });
    }

    if entries.is_empty() {
        debug!("boot signature present but every MBR slot is empty");
        return PartitionTable::Unrecognized(UnrecognizedReason::EmptyMbr);
    }
    PartitionTable::Mbr(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a boot sector. Each tuple is (slot index, type byte, first_lba,
    /// sector count); unlisted slots stay zeroed.
    fn make_test_mbr(slots: &[(usize, u8, u32, u32)]) -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[510] = 0x55;
        data[511] = 0xaa;
        for &(index, type_byte, first, count) in slots {
            let off = 0x1be + index * 16;
            data[off + 4] = type_byte;
            data[off + 8..off + 12].copy_from_slice(&first.to_le_bytes());
            data[off + 12..off + 16].copy_from_slice(&count.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_decode_mbr_entries() {
        let data = make_test_mbr(&[(0, 0x83, 2048, 8192), (1, 0x0c, 10240, 4096)]);
        let table = decode_mbr(&data);
        let PartitionTable::Mbr(entries) = table else {
            panic!("expected MBR, got {:?}", table);
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "mbr0");
        assert_eq!(entries[0].first_lba, 2048);
        assert_eq!(entries[0].last_lba, 2048 + 8192 - 1);
        assert_eq!(entries[0].size_bytes, 8192 * 512);
        assert_eq!(entries[0].type_indicator(), "0x83");
        assert_eq!(entries[1].name, "mbr1");
        assert_eq!(entries[1].type_indicator(), "0x0c");
    }

    #[test]
    fn test_mbr_names_keep_slot_index() {
        // Four populated slots, then slot 1 zeroed: names must keep the
        // original slot numbering, not renumber.
        let data = make_test_mbr(&[
            (0, 0x83, 100, 10),
            (2, 0x83, 300, 10),
            (3, 0x83, 400, 10),
        ]);
        let table = decode_mbr(&data);
        let names: Vec<_> = table.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["mbr0", "mbr2", "mbr3"]);
    }

    #[test]
    fn test_mbr_skips_zero_sector_count() {
        let data = make_test_mbr(&[(0, 0x83, 100, 0), (1, 0x83, 200, 10)]);
        let table = decode_mbr(&data);
        let names: Vec<_> = table.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["mbr1"]);
    }

    #[test]
    fn test_mbr_missing_boot_signature() {
        let mut data = make_test_mbr(&[(0, 0x83, 100, 10)]);
        data[511] = 0x00;
        assert_eq!(
            decode_mbr(&data),
            PartitionTable::Unrecognized(UnrecognizedReason::NoBootSignature)
        );
    }

    #[test]
    fn test_mbr_with_no_populated_slots() {
        let data = make_test_mbr(&[]);
        assert_eq!(
            decode_mbr(&data),
            PartitionTable::Unrecognized(UnrecognizedReason::EmptyMbr)
        );
    }

    #[test]
    fn test_mbr_short_buffer() {
        assert_eq!(
            decode_mbr(&[0u8; 100]),
            PartitionTable::Unrecognized(UnrecognizedReason::TooShort)
        );
    }
}
