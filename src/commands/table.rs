//! Table command: raw partition table image to keyed bounds JSON

use std::fs;
use std::path::Path;

use partmap_core::bounds::BoundsMap;
use partmap_core::dump;
use partmap_core::table::PartitionTable;

/// Decode the table in `input` (a file, or a dump directory to search) and
/// write the keyed bounds document to `output`.
///
/// A dump with no table candidate still produces a document, with mode
/// `none` and no entries; absence of a table is a finding, not a failure.
pub fn cmd_table(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = if input.is_dir() {
        dump::find_table_image(input)
    } else {
        Some(input.to_path_buf())
    };

    let (mode, bounds, notes) = match &source {
        Some(path) => {
            let table = PartitionTable::decode_file(path)?;
            log::info!(
                "{}: {} with {} entries",
                path.display(),
                table.scheme(),
                table.entries().len()
            );
            let mut notes = Vec::new();
            if let PartitionTable::Unrecognized(reason) = &table {
                notes.push(format!("{}: {}", path.display(), reason));
            }
            (table.scheme(), BoundsMap::from_entries(table.entries()), notes)
        }
        None => {
            println!("No partition table candidate under {}", input.display());
            let note = format!("no table image candidate found under {}", input.display());
            ("none", BoundsMap::default(), vec![note])
        }
    };

    let doc = serde_json::json!({
        "meta": {
            "input": input.display().to_string(),
            "source": source.as_ref().map(|path| path.display().to_string()),
            "mode": mode,
            "notes": notes,
        },
        "partitions": bounds.partitions,
    });

    let mut json = serde_json::to_string_pretty(&doc)?;
    json.push('\n');
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, json)?;

    println!(
        "Wrote {} entries ({}) to {}",
        bounds.len(),
        mode,
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-slot MBR boot sector.
    fn mbr_image() -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[510] = 0x55;
        data[511] = 0xaa;
        data[0x1be + 4] = 0x83;
        data[0x1be + 8..0x1be + 12].copy_from_slice(&2048u32.to_le_bytes());
        data[0x1be + 12..0x1be + 16].copy_from_slice(&8192u32.to_le_bytes());
        data
    }

    #[test]
    fn test_table_from_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("mbr.bin");
        fs::write(&image, mbr_image()).unwrap();
        let out = dir.path().join("bounds.json");

        cmd_table(&image, &out).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(doc["meta"]["mode"], "mbr");
        assert_eq!(doc["partitions"]["PART_MBR0"]["first_lba"], 2048);
        assert_eq!(doc["partitions"]["PART_MBR0"]["type"], "0x83");
    }

    #[test]
    fn test_table_searches_dump_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("flash")).unwrap();
        fs::write(dir.path().join("flash/mbr.bin"), mbr_image()).unwrap();
        let out = dir.path().join("bounds.json");

        cmd_table(dir.path(), &out).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(doc["meta"]["mode"], "mbr");
        assert!(doc["meta"]["source"]
            .as_str()
            .unwrap()
            .ends_with("flash/mbr.bin"));
    }

    #[test]
    fn test_table_without_candidate_reports_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("unrelated.txt"), "x").unwrap();
        let out = dir.path().join("bounds.json");

        cmd_table(dir.path(), &out).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(doc["meta"]["mode"], "none");
        assert_eq!(doc["meta"]["source"], serde_json::Value::Null);
        assert!(doc["partitions"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_table_unrecognized_image_notes_reason() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("garbage.bin");
        fs::write(&image, vec![0x5a; 1024]).unwrap();
        let out = dir.path().join("bounds.json");

        cmd_table(&image, &out).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(doc["meta"]["mode"], "unknown");
        assert!(doc["partitions"].as_object().unwrap().is_empty());
        assert!(!doc["meta"]["notes"].as_array().unwrap().is_empty());
    }
}
