//! Reconcile command: descriptor plus optional table bounds to report

use std::fs;
use std::path::Path;

use partmap_core::bounds::BoundsMap;
use partmap_core::dump;
use partmap_core::reconcile::reconcile;
use partmap_core::report::{PartitionMapReport, ReportMeta};
use partmap_core::swdesc;

/// Locate the descriptor under `dump_root`, merge it against the optional
/// bounds document and write the report to `output`.
pub fn cmd_reconcile(
    dump_root: &Path,
    output: &Path,
    bounds_check: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(descriptor) = dump::find_descriptor(dump_root) else {
        eprintln!(
            "Error: no {} found under {}",
            swdesc::DESCRIPTOR_NAME,
            dump_root.display()
        );
        std::process::exit(1);
    };
    log::info!("parsing {}", descriptor.display());

    let text = swdesc::read_descriptor_file(&descriptor)?;
    let scan = swdesc::parse_descriptor(&text);
    log::info!(
        "{} update blocks ({} dropped)",
        scan.blocks.len(),
        scan.blocks_dropped
    );

    // A bounds file that cannot be used downgrades the run instead of
    // failing it; the report still carries everything the descriptor gave.
    let mut preface: Vec<String> = Vec::new();
    let bounds = match bounds_check {
        Some(path) => match BoundsMap::load(path) {
            Ok(map) => {
                log::info!("loaded {} bounds entries from {}", map.len(), path.display());
                Some(map)
            }
            Err(err) => {
                log::warn!("ignoring bounds file {}: {}", path.display(), err);
                preface.push(format!("bounds file {} ignored: {}", path.display(), err));
                None
            }
        },
        None => None,
    };

    let mut merged = reconcile(&scan.blocks, bounds.as_ref());
    if !preface.is_empty() {
        preface.append(&mut merged.warnings);
        merged.warnings = preface;
    }

    let source_bounds = bounds
        .as_ref()
        .and(bounds_check)
        .map(|path| path.display().to_string());
    let meta = ReportMeta::new(
        dump_root.display().to_string(),
        descriptor.display().to_string(),
        source_bounds,
        &scan,
    );

    let report = PartitionMapReport::new(meta, merged);
    if !report.warnings.is_empty() {
        log::warn!("{} warnings recorded in report", report.warnings.len());
    }

    let json = report.to_json()?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, json)?;

    println!(
        "Wrote {} partitions to {}",
        report.partitions.len(),
        output.display()
    );
    Ok(())
}
