//! Keyed partition bounds
//!
//! The `table` subcommand serializes decoder output as a keyed map; the
//! `reconcile` subcommand loads the same shape back as an optional
//! cross-check against the descriptor. The format is also accepted from
//! other tooling, so deserialization tolerates missing fields and ignores
//! unknown ones.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reconcile::partition_key;
use crate::table::TableEntry;

/// One partition's bounds, keyed the same way report records are.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundsEntry {
    /// Entry name as decoded from the table
    #[serde(default)]
    pub name: String,
    /// First logical block, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_lba: Option<u64>,
    /// Last logical block, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lba: Option<u64>,
    /// Size in bytes, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Scheme-specific type indicator
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Bounds for a whole device, keyed by derived partition key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundsMap {
    /// Keyed entries; iteration order is the key order
    #[serde(default)]
    pub partitions: BTreeMap<String, BoundsEntry>,
}

impl BoundsMap {
    /// Key decoded table entries. Two entries whose names collapse to the
    /// same key get `_2`, `_3`, ... suffixes in slot order.
    pub fn from_entries(entries: &[TableEntry]) -> BoundsMap {
        let mut partitions = BTreeMap::new();
        for entry in entries {
            let base = partition_key(&entry.name);
            let mut key = base.clone();
            let mut n = 2;
            while partitions.contains_key(&key) {
                key = format!("{}_{}", base, n);
                n += 1;
            }
            partitions.insert(
                key,
                BoundsEntry {
                    name: entry.name.clone(),
                    first_lba: Some(entry.first_lba),
                    last_lba: Some(entry.last_lba),
                    size_bytes: Some(entry.size_bytes),
                    kind: Some(entry.kind.indicator()),
                },
            );
        }
        BoundsMap { partitions }
    }

    /// Load a bounds document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<BoundsMap> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Number of keyed entries.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
