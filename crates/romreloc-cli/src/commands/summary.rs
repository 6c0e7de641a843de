//! Human-readable run summary.

use std::path::Path;

use owo_colors::OwoColorize;
use romreloc::{ComparisonResult, confidence_marker, format_address, format_offset};

use super::hex_utils::{format_bytes, format_signed};

const RULE: &str = "============================================================";

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

fn colored_marker(confidence: f64) -> String {
    let marker = confidence_marker(confidence);
    if confidence >= 0.9 {
        marker.green().to_string()
    } else if confidence >= 0.7 {
        marker.yellow().to_string()
    } else {
        marker.red().to_string()
    }
}

/// Render the summary printed after `compare`
pub fn render(result: &ComparisonResult, change_limit: usize) -> String {
    let summary = &result.report.summary;
    let mut out = String::new();

    out.push_str(&format!("{}\n{}\n{}\n\n", RULE, "ROM COMPARISON RESULTS".bold(), RULE));

    out.push_str("ROM Information:\n");
    out.push_str(&format!("  Vanilla: {}\n", file_name(&summary.vanilla_rom)));
    out.push_str(&format!("  Patched: {}\n\n", file_name(&summary.patched_rom)));

    out.push_str("Analysis Statistics:\n");
    out.push_str(&format!("  Difference ranges: {}\n", result.difference_count));
    out.push_str(&format!("  Code changes found: {}\n", result.code_changes.len()));
    out.push_str(&format!("  Memory relocations: {}\n\n", result.mappings.len()));

    for warning in &result.warnings {
        out.push_str(&format!("{} {}\n", "warning:".yellow(), warning));
    }
    if !result.warnings.is_empty() {
        out.push('\n');
    }

    if result.mappings.is_empty() {
        out.push_str("No memory relocations detected.\n");
    } else {
        out.push_str("Relocations:\n");
        for m in &result.mappings {
            out.push_str(&format!(
                "  {} {}: {} -> {} (offset: {}, {:.0}%, {})\n",
                colored_marker(m.confidence),
                m.structure_name,
                format_address(m.vanilla_address),
                format_address(m.patched_address),
                format_signed(m.offset()),
                m.confidence * 100.0,
                m.pass
            ));
        }
    }

    if !result.unresolved().is_empty() {
        out.push_str("\nUnresolved (address unknown):\n");
        out.push_str(&format!("  {}\n", result.unresolved().join(", ")));
    }

    if !result.code_changes.is_empty() {
        let shown = result.code_changes.len().min(change_limit);
        out.push_str(&format!(
            "\nMemory-Related Code Changes (first {} of {}):\n",
            shown,
            result.code_changes.len()
        ));
        for change in result.code_changes.iter().take(change_limit) {
            out.push_str(&format!(
                "  {}  {:<10} {} -> {}",
                format_offset(change.offset),
                change.instruction(),
                format_bytes(&change.vanilla_bytes),
                format_bytes(&change.patched_bytes)
            ));
            match (change.vanilla_address(), change.patched_address()) {
                (Some(old), Some(new)) => out.push_str(&format!(
                    "  [{} -> {}]",
                    format_address(old),
                    format_address(new)
                )),
                (None, Some(new)) => out.push_str(&format!("  [new {}]", format_address(new))),
                _ => {}
            }
            out.push('\n');
        }
    }

    out
}
