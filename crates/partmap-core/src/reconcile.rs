//! Descriptor and table reconciliation
//!
//! Folds descriptor blocks into keyed partition records, in block order,
//! with no state beyond the accumulating result. The descriptor is the
//! source of truth: decoded table bounds only decorate records, they never
//! create, remove, or rename them.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundsMap;
use crate::classify::{classify, Role};
use crate::swdesc::{UpdateBlock, Value};
use crate::table::SECTOR_SIZE;

/// Longest key derived from a label, not counting the `PART_` prefix.
const MAX_KEY_LEN: usize = 60;

/// One partition in the reconciled map.
///
/// `first_lba`, `last_lba`, `size_bytes` and `table_match` are present only
/// when a table entry was matched; consumers distinguish "no bounds known"
/// from a zero bound by the fields being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionRecord {
    /// Derived report key, duplicated from the map for self-contained records
    pub key: String,
    /// Display name, the longest human-given label seen for the device
    pub name: String,
    /// Device node the record is keyed on
    pub device: String,
    /// Update type from the descriptor, empty when none was given
    #[serde(rename = "type")]
    pub kind: String,
    /// Classified role
    pub role: Role,
    /// A/B slot: 0 for the A family, 1 for B, -1 when not slotted
    pub slot: i8,
    /// Whether damaging this partition likely bricks the device
    pub critical: bool,
    /// Whether the update package writes any payload to this partition
    pub updateable: bool,
    /// Payload files for this partition, sorted, deduplicated
    pub images: Vec<String>,
    /// First logical block from the matched table entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_lba: Option<u64>,
    /// Last logical block from the matched table entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lba: Option<u64>,
    /// Size in bytes from the matched table entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Key of the matched bounds entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_match: Option<String>,
    /// Typed descriptor assignments from the creating block
    #[serde(default)]
    pub sw_fields: BTreeMap<String, Value>,
}

/// Reverse image index entry: where one payload file is used.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageUsage {
    /// Number of times the file is declared across all blocks
    pub count: usize,
    /// Keys of the partitions the file lands on, sorted, deduplicated
    pub partitions: Vec<String>,
}

/// Result of the merge fold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// Partition records by derived key
    pub partitions: BTreeMap<String, PartitionRecord>,
    /// Reverse index from payload file name to usage
    pub images: BTreeMap<String, ImageUsage>,
    /// Human-readable anomalies, in detection order
    pub warnings: Vec<String>,
}

/// Merge descriptor blocks into a partition map, optionally decorating the
/// records with bounds from a decoded table.
///
/// Blocks are folded left to right. The first block for a device creates its
/// record and fixes key, role, slot, criticality and bounds; later sightings
/// of the same device only widen the image list and may improve the name.
pub fn reconcile(blocks: &[UpdateBlock], bounds: Option<&BoundsMap>) -> Reconciliation {
    let mut partitions: BTreeMap<String, PartitionRecord> = BTreeMap::new();
    let mut images: BTreeMap<String, ImageUsage> = BTreeMap::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut key_by_device: HashMap<String, String> = HashMap::new();

    for block in blocks {
        let label = block_label(block);
        let key = if let Some(existing) = key_by_device.get(&block.device) {
            if let Some(record) = partitions.get_mut(existing) {
                absorb_sighting(record, &label, &block.images);
            }
            existing.clone()
        } else {
            let key = unique_key(&label, &partitions, &block.device, &mut warnings);
            let record = build_record(&key, label, block, bounds, &mut warnings);
            partitions.insert(key.clone(), record);
            key_by_device.insert(block.device.clone(), key.clone());
            key
        };

        for image in &block.images {
            let usage = images.entry(image.clone()).or_default();
            usage.count += 1;
            usage.partitions.push(key.clone());
        }
    }

    for usage in images.values_mut() {
        usage.partitions.sort();
        usage.partitions.dedup();
    }

    check_spans(&partitions, &mut warnings);

    Reconciliation { partitions, images, warnings }
}

/// Uppercase `label`, collapse every non-alphanumeric run to a single
/// underscore, trim underscores at the ends and bound the length. Labels
/// with no alphanumeric content at all become `UNKNOWN`.
pub fn safe_key(label: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_uppercase());
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        return "UNKNOWN".to_string();
    }
    out.truncate(MAX_KEY_LEN);
    out
}

/// Report key for a label.
pub fn partition_key(label: &str) -> String {
    format!("PART_{}", safe_key(label))
}

/// Lowercase alphanumeric projection used to match descriptor names against
/// table entry names, so `rootfs_a` and `ROOTFS-A` compare equal.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Display label for a block: its name, else the `partition` or `target`
/// attribute, else the device node.
fn block_label(block: &UpdateBlock) -> String {
    if let Some(name) = &block.name {
        if !name.is_empty() {
            return name.clone();
        }
    }
    for attr in ["partition", "target"] {
        if let Some(Value::Str(s)) = block.attrs.get(attr) {
            if !s.is_empty() {
                return s.clone();
            }
        }
    }
    block.device.clone()
}

/// Derive a map key for a new record, suffixing `_2`, `_3`, ... when another
/// device already claimed the base key.
fn unique_key(
    label: &str,
    partitions: &BTreeMap<String, PartitionRecord>,
    device: &str,
    warnings: &mut Vec<String>,
) -> String {
    let base = partition_key(label);
    if !partitions.contains_key(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if !partitions.contains_key(&candidate) {
            warnings.push(format!(
                "duplicate key {} for device {}; recorded as {}",
                base, device, candidate
            ));
            return candidate;
        }
        n += 1;
    }
}

/// Build the record for the first sighting of a device.
fn build_record(
    key: &str,
    label: String,
    block: &UpdateBlock,
    bounds: Option<&BoundsMap>,
    warnings: &mut Vec<String>,
) -> PartitionRecord {
    let kind = block
        .kind
        .clone()
        .or_else(|| match block.attrs.get("type") {
            Some(Value::Str(s)) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let classification = classify(&label, &block.device, &block.images, &kind);

    let mut images = block.images.clone();
    images.sort();
    images.dedup();
    let updateable = !images.is_empty();

    let mut record = PartitionRecord {
        key: key.to_string(),
        name: label,
        device: block.device.clone(),
        kind,
        role: classification.role,
        slot: classification.slot,
        critical: classification.critical,
        updateable,
        images,
        first_lba: None,
        last_lba: None,
        size_bytes: None,
        table_match: None,
        sw_fields: block.attrs.clone(),
    };
    if let Some(map) = bounds {
        attach_bounds(&mut record, map, warnings);
    }
    record
}

/// Fold a repeat sighting of a device into its record: widen the image
/// list and prefer a longer human-given name over a shorter one or a bare
/// device path.
fn absorb_sighting(record: &mut PartitionRecord, label: &str, images: &[String]) {
    if !images.is_empty() {
        record.images.extend(images.iter().cloned());
        record.images.sort();
        record.images.dedup();
        record.updateable = true;
    }
    if record.name.starts_with("/dev/") || label.len() > record.name.len() {
        record.name = label.to_string();
    }
}

/// Attach table bounds to a freshly created record. The match must be
/// unique under name normalization; an ambiguous match is warned about and
/// skipped, attaching the wrong bounds being worse than attaching none.
fn attach_bounds(record: &mut PartitionRecord, bounds: &BoundsMap, warnings: &mut Vec<String>) {
    let wanted = normalize_name(&record.name);
    if wanted.is_empty() {
        return;
    }

    let matched: Vec<(&String, u64, u64, Option<u64>)> = bounds
        .partitions
        .iter()
        .filter_map(|(key, entry)| match (entry.first_lba, entry.last_lba) {
            (Some(first), Some(last)) if normalize_name(&entry.name) == wanted => {
                Some((key, first, last, entry.size_bytes))
            }
            _ => None,
        })
        .collect();

    match matched.as_slice() {
        [] => {
            debug!("no table entry matches {}", record.key);
        }
        [(key, first, last, size)] => {
            let computed = if last >= first {
                (last - first)
                    .checked_add(1)
                    .and_then(|sectors| sectors.checked_mul(SECTOR_SIZE))
            } else {
                None
            };
            let Some(size_bytes) = computed.map(|c| size.unwrap_or(c)) else {
                warnings.push(format!(
                    "table entry {} has unusable bounds {}..{}, not attached",
                    key, first, last
                ));
                return;
            };
            record.first_lba = Some(*first);
            record.last_lba = Some(*last);
            record.size_bytes = Some(size_bytes);
            record.table_match = Some((*key).clone());
        }
        several => {
            let candidates: Vec<&str> = several.iter().map(|(key, ..)| key.as_str()).collect();
            warnings.push(format!(
                "ambiguous table match for {}: candidates {}",
                record.key,
                candidates.join(", ")
            ));
        }
    }
}

/// Warn about records whose attached LBA ranges overlap. Overlap on a dump
/// usually means the descriptor and the flash image disagree about which
/// layout generation is current.
fn check_spans(partitions: &BTreeMap<String, PartitionRecord>, warnings: &mut Vec<String>) {
    let mut spans: Vec<(u64, u64, &str)> = partitions
        .values()
        .filter_map(|record| match (record.first_lba, record.last_lba) {
            (Some(first), Some(last)) => Some((first, last, record.key.as_str())),
            _ => None,
        })
        .collect();
    spans.sort();

    for pair in spans.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.0 <= prev.1 {
            warnings.push(format!(
                "LBA ranges overlap: {} ({}..{}) and {} ({}..{})",
                prev.2, prev.0, prev.1, next.2, next.0, next.1
            ));
        }
    }
}
