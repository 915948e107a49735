//! Dump directory discovery
//!
//! Forensic dumps arrive as loose directory trees with no fixed layout, so
//! inputs are found by file name. Traversal is depth-first with entries in
//! name order, which makes discovery deterministic for a given tree.
//! Symlinks are not followed; a dump must not be able to point the engine
//! outside itself.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::swdesc::DESCRIPTOR_NAME;

/// File names that may hold a raw partition table, in priority order. Each
/// name is searched through the whole tree before the next is tried, so a
/// dedicated table dump beats a whole-device image.
pub const TABLE_IMAGE_NAMES: &[&str] = &[
    "gpt.bin",
    "partition.bin",
    "pt.bin",
    "mmcblk0.bin",
    "disk.img",
    "emmc.img",
    "mbr.bin",
];

/// Locate the update descriptor under `root`.
pub fn find_descriptor(root: &Path) -> Option<PathBuf> {
    let found = find_named(root, DESCRIPTOR_NAME);
    match &found {
        Some(path) => debug!("descriptor at {}", path.display()),
        None => debug!("no {} under {}", DESCRIPTOR_NAME, root.display()),
    }
    found
}

/// Locate a partition table image under `root`, trying
/// [`TABLE_IMAGE_NAMES`] in order.
pub fn find_table_image(root: &Path) -> Option<PathBuf> {
    TABLE_IMAGE_NAMES.iter().find_map(|name| find_named(root, name))
}

/// First file called `name` in a depth-first, name-ordered walk of `dir`.
/// Unreadable directories are skipped, not fatal.
fn find_named(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut entries: Vec<_> = fs::read_dir(dir).ok()?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirs = Vec::new();
    for entry in entries {
        let Ok(file_type) = entry.file_type() else { continue };
        if file_type.is_file() {
            if entry.file_name() == name {
                return Some(entry.path());
            }
        } else if file_type.is_dir() {
            subdirs.push(entry.path());
        }
    }

    subdirs.into_iter().find_map(|subdir| find_named(&subdir, name))
}
