//! Update descriptor parsing
//!
//! The `sw-description` manifest shipped in update packages declares, for
//! every update target, the device node it lands on and the payload files
//! written to it. The manifest is the primary source of truth for the
//! partition map: unlike the flash contents, it states intent.
//!
//! Parsing is deliberately shallow. Rather than committing to one dialect of
//! the format, [`parse_descriptor`] collects every block that names a
//! `device` and reads the assignments inside it. Blocks that cannot be tied
//! to a device, or that carry neither a name nor a payload, are counted and
//! dropped, never fatal.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;

mod scanner;

use scanner::RawValue;

/// File name of the update descriptor inside a dump.
pub const DESCRIPTOR_NAME: &str = "sw-description";

/// Upper bound on the descriptor size. Real manifests are a few kilobytes;
/// anything near this bound is garbage input we still refuse to choke on.
pub const MAX_DESCRIPTOR_BYTES: u64 = 50 * 1000 * 1000;

/// A typed assignment value from the descriptor.
///
/// The untagged serialization writes these as native JSON scalars, which is
/// what report consumers expect for `sw_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// `true` / `false`
    Bool(bool),
    /// Unsigned integer literal
    Int(u64),
    /// Quoted string, escapes resolved
    Str(String),
}

/// One update target extracted from the descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBlock {
    /// Normalized device node, e.g. `/dev/mmcblk0p3`
    pub device: String,
    /// First quoted `name` in the block, when present
    pub name: Option<String>,
    /// First quoted `type` in the block, when present
    pub kind: Option<String>,
    /// Every quoted `filename`, in order, duplicates kept
    pub images: Vec<String>,
    /// All typed assignments in the block, last occurrence wins
    pub attrs: BTreeMap<String, Value>,
}

/// Outcome of scanning a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorScan {
    /// Update targets that survived extraction, in document order
    pub blocks: Vec<UpdateBlock>,
    /// Device-bearing blocks found before filtering
    pub blocks_seen: usize,
    /// Blocks discarded for an unresolvable device or an empty payload
    pub blocks_dropped: usize,
}

/// Scan descriptor text for update targets.
pub fn parse_descriptor(text: &str) -> DescriptorScan {
    let spans = scanner::device_blocks(text);
    let blocks_seen = spans.len();

    let mut blocks = Vec::new();
    for span in spans {
        if let Some(block) = extract_block(span) {
            blocks.push(block);
        }
    }

    let blocks_dropped = blocks_seen - blocks.len();
    DescriptorScan { blocks, blocks_seen, blocks_dropped }
}

/// Read a descriptor file as text, reading at most [`MAX_DESCRIPTOR_BYTES`]
/// and replacing invalid UTF-8 rather than failing on it.
pub fn read_descriptor_file(path: impl AsRef<Path>) -> Result<String> {
    let file = File::open(path)?;
    let mut raw = Vec::new();
    file.take(MAX_DESCRIPTOR_BYTES).read_to_end(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Pull the fields out of one device-bearing block span.
fn extract_block(span: &str) -> Option<UpdateBlock> {
    let mut device_raw: Option<String> = None;
    let mut name: Option<String> = None;
    let mut kind: Option<String> = None;
    let mut images: Vec<String> = Vec::new();
    let mut attrs: BTreeMap<String, Value> = BTreeMap::new();

    for assignment in scanner::assignments(span) {
        match (assignment.key, &assignment.value) {
            ("device", _) if device_raw.is_none() => {
                device_raw = Some(assignment.value.text().to_string());
            }
            ("name", RawValue::Str(s)) if name.is_none() => name = Some(s.clone()),
            ("type", RawValue::Str(s)) if kind.is_none() => kind = Some(s.clone()),
            ("filename", RawValue::Str(s)) => images.push(s.clone()),
            _ => {}
        }
        if let Some(value) = type_value(&assignment.value) {
            attrs.insert(assignment.key.to_string(), value);
        }
    }

    let device = normalize_device(device_raw.as_deref().unwrap_or_default());
    if device.is_empty() {
        debug!("dropping block without a resolvable device");
        return None;
    }
    if name.is_none() && images.is_empty() {
        debug!("dropping block for {} with neither name nor payload", device);
        return None;
    }

    Some(UpdateBlock { device, name, kind, images, attrs })
}

/// Type a raw value. Quoted strings stay strings; bare tokens become
/// booleans or integers when they read as one, and are otherwise structural
/// (device paths, malformed junk) and not recorded.
fn type_value(raw: &RawValue<'_>) -> Option<Value> {
    match raw {
        RawValue::Str(s) => Some(Value::Str(s.clone())),
        RawValue::Bare("true") => Some(Value::Bool(true)),
        RawValue::Bare("false") => Some(Value::Bool(false)),
        RawValue::Bare(token) if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) => {
            match token.parse::<u64>() {
                Ok(n) => Some(Value::Int(n)),
                Err(_) => Some(Value::Str((*token).to_string())),
            }
        }
        RawValue::Bare(_) => None,
    }
}

/// Normalize a device value: trim it and give bare `mmcblk*` names their
/// `/dev/` prefix, so the same partition referenced both ways merges.
fn normalize_device(raw: &str) -> String {
    let device = raw.trim();
    if !device.starts_with("/dev/") && device.starts_with("mmcblk") {
        format!("/dev/{}", device)
    } else {
        device.to_string()
    }
}
