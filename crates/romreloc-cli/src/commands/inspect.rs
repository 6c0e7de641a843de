//! Inspect command implementation.
//!
//! Works on a single image: prints the cartridge header and counts how the
//! code addresses each known structure.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use romreloc::{
    RomImage, WORK_RAM, census_references, format_address, format_offset, rank_pointer_targets,
};

use super::compare::resolve_catalog;

/// Reference offsets listed per kind before truncating
const MAX_LISTED_OFFSETS: usize = 5;

/// Run the inspect command
pub fn run(rom: &Path, catalog: Option<&Path>, extra: &[u16], top: usize) -> Result<()> {
    let image = RomImage::load(rom).context("Failed to load ROM")?;
    let catalog = resolve_catalog(catalog)?;

    println!("{} ({} bytes)", image.name().bold(), image.len());
    match image.header() {
        Some(header) => {
            println!("  Title:     {}", header.title);
            println!("  Game code: {}", header.game_code);
            println!("  CGB flag:  0x{:02X}", header.cgb_flag);
            println!("  Version:   {}", header.version);
            let checksum = format!(
                "0x{:02X} (computed 0x{:02X})",
                header.header_checksum, header.computed_header_checksum
            );
            if header.header_checksum_valid() {
                println!("  Header checksum: {} {}", checksum, "ok".green());
            } else {
                println!("  Header checksum: {} {}", checksum, "mismatch".red());
            }
            println!("  Global checksum: 0x{:04X}", header.global_checksum);
            if !header.looks_like_target() {
                println!("  {}", "Title does not match the target game".yellow());
            }
        }
        None => println!("  {}", "No cartridge header (image too short)".yellow()),
    }
    println!();

    println!("Direct references ({}):", catalog.version);
    let targets = catalog
        .iter()
        .map(|s| (s.name.as_str(), s.vanilla_address))
        .chain(extra.iter().map(|&a| ("(extra)", a)));
    for (name, address) in targets {
        let census = census_references(image.bytes(), address);
        println!(
            "  {:<16} {}  loads {:>3}  stores {:>3}",
            name,
            format_address(address),
            census.loads.len(),
            census.stores.len()
        );
        for (kind, offsets) in [("load", &census.loads), ("store", &census.stores)] {
            if offsets.is_empty() {
                continue;
            }
            let listed: Vec<String> = offsets
                .iter()
                .take(MAX_LISTED_OFFSETS)
                .map(|&o| format_offset(o))
                .collect();
            let more = offsets.len().saturating_sub(MAX_LISTED_OFFSETS);
            if more > 0 {
                println!("      {:<5} {} (+{} more)", kind, listed.join(", "), more);
            } else {
                println!("      {:<5} {}", kind, listed.join(", "));
            }
        }
    }
    println!();

    // catalogue addresses were counted above
    let known: Vec<u16> = catalog.iter().map(|s| s.vanilla_address).collect();
    println!("Most common LD HL,nn targets outside the catalogue:");
    for target in rank_pointer_targets(image.bytes(), &WORK_RAM, &known, top) {
        println!(
            "  {}: {:>3} references, first at {} (bank {}, +0x{:04X})",
            format_address(target.address),
            target.count,
            format_offset(target.first_offset),
            target.bank(),
            target.bank_offset()
        );
    }

    Ok(())
}
