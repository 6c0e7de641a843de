//! Diff command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use romreloc::{RomImage, find_differences, format_offset};

use super::hex_utils::format_bytes;

/// Bytes of each side shown per range
const PREVIEW_BYTES: usize = 8;

/// Print the differing byte ranges of two images
pub fn run(vanilla: &Path, patched: &Path, limit: usize) -> Result<()> {
    let vanilla = RomImage::load(vanilla).context("Failed to load vanilla ROM")?;
    let patched = RomImage::load(patched).context("Failed to load patched ROM")?;

    if vanilla.len() != patched.len() {
        println!(
            "Sizes differ: vanilla {} bytes, patched {} bytes (only the common prefix is compared)",
            vanilla.len(),
            patched.len()
        );
    }

    let differences = find_differences(vanilla.bytes(), patched.bytes());
    let total_bytes: usize = differences.iter().map(|d| d.len()).sum();
    println!(
        "{} difference ranges ({} bytes)",
        differences.len(),
        total_bytes
    );
    println!();

    for diff in differences.iter().take(limit) {
        let shown = diff.len().min(PREVIEW_BYTES);
        let old = &vanilla.bytes()[diff.as_range()][..shown];
        let new = &patched.bytes()[diff.as_range()][..shown];
        let ellipsis = if diff.len() > PREVIEW_BYTES { " ..." } else { "" };
        println!(
            "{}..{} ({:>5} bytes)  {}{} -> {}{}",
            format_offset(diff.start),
            format_offset(diff.end),
            diff.len(),
            format_bytes(old),
            ellipsis,
            format_bytes(new),
            ellipsis
        );
    }

    if differences.len() > limit {
        println!("... {} more", differences.len() - limit);
    }

    Ok(())
}
