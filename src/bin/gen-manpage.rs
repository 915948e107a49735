//! Man page generator for partmap
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::PathBuf;

#[path = "../cli.rs"]
mod cli;

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Default to ./man directory
    let output_dir = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("man")
    };

    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();

    // One page per subcommand next to the main page, so `man partmap-reconcile`
    // works after install.
    for sub in cmd.get_subcommands() {
        let name = format!("partmap-{}", sub.get_name());
        let man = clap_mangen::Man::new(sub.clone().name(&name));
        let mut buffer = Vec::new();
        man.render(&mut buffer)?;
        fs::write(output_dir.join(format!("{}.1", name)), buffer)?;
    }

    let man = clap_mangen::Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    let output_path = output_dir.join("partmap.1");
    fs::write(&output_path, buffer)?;

    println!("Man pages generated in: {}", output_dir.display());
    println!("\nTo view the main page:");
    println!("  man -l {}", output_path.display());
    println!("\nTo install system-wide (requires sudo):");
    println!("  sudo cp {}/*.1 /usr/local/share/man/man1/", output_dir.display());
    println!("  sudo mandb");

    Ok(())
}
