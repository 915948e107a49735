//! Show command: render a report for human reading

use std::fs;
use std::path::Path;

use partmap_core::report::PartitionMapReport;

/// Print a summary of a previously written report.
pub fn cmd_show(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(file)?;
    let report = PartitionMapReport::from_json(&text)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &PartitionMapReport) {
    println!("Partition Map");
    println!("=============");
    println!("Dump root:  {}", report.meta.dump_root);
    println!("Descriptor: {}", report.meta.source_sw_description);
    if let Some(bounds) = &report.meta.source_bounds_check {
        println!("Bounds:     {}", bounds);
    }
    println!("Mode:       {}", report.meta.mode);
    println!(
        "Blocks:     {} scanned, {} dropped",
        report.meta.blocks_scanned, report.meta.blocks_dropped
    );

    println!("\nPartitions ({}):", report.partitions.len());
    println!(
        "{:<26} {:<14} {:<18} {:<10} {:>4} {:>5} {:>4} {:>12}",
        "Key", "Name", "Device", "Role", "Slot", "Crit", "Upd", "Size"
    );
    println!("{:-<100}", "");

    for record in report.partitions.values() {
        let size = record
            .size_bytes
            .map(super::format_size)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<26} {:<14} {:<18} {:<10} {:>4} {:>5} {:>4} {:>12}",
            record.key,
            record.name,
            record.device,
            record.role,
            record.slot,
            if record.critical { "yes" } else { "-" },
            if record.updateable { "yes" } else { "-" },
            size,
        );
    }

    if !report.images.is_empty() {
        println!("\nImages ({}):", report.images.len());
        for (name, usage) in &report.images {
            println!(
                "  {:<28} x{} -> {}",
                name,
                usage.count,
                usage.partitions.join(", ")
            );
        }
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  {}", warning);
        }
    }
}
