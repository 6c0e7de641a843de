//! Instruction pattern matching over difference windows
//!
//! The matcher has no notion of code vs. data and does not check that a
//! matched opcode sits on a real instruction boundary. Every `CodeChange` it
//! emits is a hint; the inference engine is responsible for corroboration.

pub mod references;

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::{AddressWindow, WORK_RAM};
use crate::diff::{DifferenceRange, scan_windows};
use crate::opcode::Encoding;
use crate::rom::ImageSide;

pub use references::{
    PointerTarget, ROM_BANK_SIZE, ReferenceCensus, census_references, rank_pointer_targets,
};

/// One recognised address-bearing encoding in one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionObservation {
    pub offset: usize,
    pub encoding: Encoding,
    pub operand: u16,
    pub side: ImageSide,
}

impl InstructionObservation {
    pub fn observe(bytes: &[u8], offset: usize, side: ImageSide) -> Option<Self> {
        let (encoding, operand) = Encoding::decode_at(bytes, offset)?;
        Some(Self {
            offset,
            encoding,
            operand,
            side,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Same opcode in both images, different operand
    OperandChanged,
    /// The patched image holds an encoding the vanilla image does not
    NewInstruction,
}

/// A memory-addressing instruction that differs between the two images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChange {
    pub offset: usize,
    pub vanilla_bytes: Vec<u8>,
    pub patched_bytes: Vec<u8>,
    pub encoding: Encoding,
    pub kind: ChangeKind,
    /// Vanilla operand (if any) followed by patched operand; never empty
    pub affected_addresses: Vec<u16>,
}

impl CodeChange {
    pub fn instruction(&self) -> &'static str {
        self.encoding.mnemonic()
    }

    pub fn vanilla_address(&self) -> Option<u16> {
        if self.affected_addresses.len() >= 2 {
            self.affected_addresses.first().copied()
        } else {
            None
        }
    }

    pub fn patched_address(&self) -> Option<u16> {
        self.affected_addresses.last().copied()
    }

    pub fn references(&self, address: u16) -> bool {
        self.affected_addresses.contains(&address)
    }
}

/// Pattern matcher settings
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pub window: AddressWindow,
    pub context_bytes: usize,
    pub min_scan_width: usize,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self {
            window: WORK_RAM,
            context_bytes: 2,
            min_scan_width: 3,
        }
    }
}

impl PatternMatcher {
    /// Scan the windows around every difference range for code changes.
    ///
    /// Changes are returned in increasing offset order and no offset is
    /// examined twice, even when the windows of adjacent ranges overlap.
    pub fn scan(
        &self,
        vanilla: &[u8],
        patched: &[u8],
        differences: &[DifferenceRange],
    ) -> Vec<CodeChange> {
        let windows = scan_windows(differences, self.context_bytes, self.min_scan_width);
        debug!(
            "Scanning {} windows from {} difference ranges",
            windows.len(),
            differences.len()
        );

        let mut changes = Vec::new();
        for window in windows {
            changes.extend(self.scan_window(vanilla, patched, window));
        }

        debug!("Found {} memory-related code changes", changes.len());
        changes
    }

    fn scan_window<'a>(
        &'a self,
        vanilla: &'a [u8],
        patched: &'a [u8],
        window: Range<usize>,
    ) -> impl Iterator<Item = CodeChange> + 'a {
        window.filter_map(move |offset| self.match_offset(vanilla, patched, offset))
    }

    /// Correlate the encodings found at `offset` in both images.
    ///
    /// The two checks are alternatives: an identical opcode can only yield an
    /// operand change, a differing opcode can only yield a new instruction.
    pub fn match_offset(
        &self,
        vanilla: &[u8],
        patched: &[u8],
        offset: usize,
    ) -> Option<CodeChange> {
        let old = InstructionObservation::observe(vanilla, offset, ImageSide::Vanilla);
        let new = InstructionObservation::observe(patched, offset, ImageSide::Patched);

        if let Some(old) = old {
            if patched.get(offset) == Some(&old.encoding.opcode()) {
                let new = new?;
                return self.operand_change(vanilla, patched, old, new);
            }
        }

        let new = new?;
        if vanilla.get(offset) == Some(&new.encoding.opcode()) {
            return None;
        }
        if !self.window.contains(new.operand) {
            return None;
        }

        let mut affected_addresses = Vec::with_capacity(2);
        if let Some(old) = old.filter(|o| o.operand != 0) {
            affected_addresses.push(old.operand);
        }
        affected_addresses.push(new.operand);

        Some(CodeChange {
            offset,
            vanilla_bytes: slice_clipped(vanilla, offset, new.encoding.length()),
            patched_bytes: slice_clipped(patched, offset, new.encoding.length()),
            encoding: new.encoding,
            kind: ChangeKind::NewInstruction,
            affected_addresses,
        })
    }

    fn operand_change(
        &self,
        vanilla: &[u8],
        patched: &[u8],
        old: InstructionObservation,
        new: InstructionObservation,
    ) -> Option<CodeChange> {
        if old.operand == new.operand {
            return None;
        }
        if !self.window.contains(old.operand) && !self.window.contains(new.operand) {
            return None;
        }

        let length = old.encoding.length();
        Some(CodeChange {
            offset: old.offset,
            vanilla_bytes: slice_clipped(vanilla, old.offset, length),
            patched_bytes: slice_clipped(patched, old.offset, length),
            encoding: old.encoding,
            kind: ChangeKind::OperandChanged,
            affected_addresses: vec![old.operand, new.operand],
        })
    }
}

fn slice_clipped(bytes: &[u8], offset: usize, length: usize) -> Vec<u8> {
    let start = offset.min(bytes.len());
    let end = offset.saturating_add(length).min(bytes.len());
    bytes[start..end].to_vec()
}
