//! Byte-level difference scanning
//!
//! Produces maximal runs of differing bytes over the common prefix of two
//! images. A length mismatch on its own is not a difference.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` where every byte differs between images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferenceRange {
    pub start: usize,
    pub end: usize,
}

impl DifferenceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Find all maximal differing runs, in increasing offset order
pub fn find_differences(vanilla: &[u8], patched: &[u8]) -> Vec<DifferenceRange> {
    let limit = vanilla.len().min(patched.len());
    let mut differences = Vec::new();
    let mut i = 0;

    while i < limit {
        if vanilla[i] == patched[i] {
            i += 1;
            continue;
        }

        let start = i;
        while i < limit && vanilla[i] != patched[i] {
            i += 1;
        }
        differences.push(DifferenceRange::new(start, i));
    }

    differences
}

/// Widen each range by `context` leading bytes, merge windows that touch or
/// overlap, and drop windows narrower than `min_width`.
///
/// An opcode can sit up to two bytes before the operand byte that changed,
/// so the window rather than the raw range decides whether a 3-byte
/// encoding fits.
pub fn scan_windows(
    differences: &[DifferenceRange],
    context: usize,
    min_width: usize,
) -> Vec<Range<usize>> {
    let mut windows: Vec<Range<usize>> = Vec::with_capacity(differences.len());

    for diff in differences {
        let start = diff.start.saturating_sub(context);
        if let Some(last) = windows.last_mut() {
            if start <= last.end {
                last.end = last.end.max(diff.end);
                continue;
            }
        }
        windows.push(start..diff.end);
    }

    windows.retain(|window| window.len() >= min_width);
    windows
}
