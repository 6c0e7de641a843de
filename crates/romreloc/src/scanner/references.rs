//! Single-image reference census
//!
//! Counts the direct load/store references to a structure address and ranks
//! the working-memory pointers set up with `LD HL,nn`. Useful on a patched
//! image alone, when no vanilla image is at hand.

use std::collections::HashMap;

use memchr::memmem;

use crate::address::AddressWindow;
use crate::opcode::Encoding;

/// Direct references to one address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCensus {
    pub address: u16,
    /// Offsets of `LD A,(nn)` with `nn == address`
    pub loads: Vec<usize>,
    /// Offsets of `LD (nn),A` with `nn == address`
    pub stores: Vec<usize>,
}

impl ReferenceCensus {
    pub fn total(&self) -> usize {
        self.loads.len() + self.stores.len()
    }
}

/// Find every load and store encoding that references `address`
pub fn census_references(bytes: &[u8], address: u16) -> ReferenceCensus {
    let [lo, hi] = address.to_le_bytes();
    let load = [Encoding::LdAFromMem.opcode(), lo, hi];
    let store = [Encoding::LdMemFromA.opcode(), lo, hi];

    ReferenceCensus {
        address,
        loads: memmem::find_iter(bytes, &load).collect(),
        stores: memmem::find_iter(bytes, &store).collect(),
    }
}

/// Size of one switchable ROM bank
pub const ROM_BANK_SIZE: usize = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerTarget {
    pub address: u16,
    pub count: usize,
    /// Image offset of the first `LD HL,nn` loading this address
    pub first_offset: usize,
}

impl PointerTarget {
    /// ROM bank holding the first reference
    pub fn bank(&self) -> usize {
        self.first_offset / ROM_BANK_SIZE
    }

    /// Offset of the first reference within its bank
    pub fn bank_offset(&self) -> usize {
        self.first_offset % ROM_BANK_SIZE
    }
}

/// Rank in-window `LD HL,nn` operands by how often they appear.
///
/// Addresses in `exclude` are skipped; ties are broken by ascending address
/// so the ranking is deterministic.
pub fn rank_pointer_targets(
    bytes: &[u8],
    window: &AddressWindow,
    exclude: &[u16],
    limit: usize,
) -> Vec<PointerTarget> {
    let opcode = Encoding::LdHlImm.opcode();
    let mut targets: HashMap<u16, PointerTarget> = HashMap::new();

    for offset in memchr::memchr_iter(opcode, bytes) {
        let Some((_, operand)) = Encoding::decode_at(bytes, offset) else {
            continue;
        };
        if !window.contains(operand) || exclude.contains(&operand) {
            continue;
        }
        targets
            .entry(operand)
            .or_insert(PointerTarget {
                address: operand,
                count: 0,
                first_offset: offset,
            })
            .count += 1;
    }

    let mut ranked: Vec<PointerTarget> = targets.into_values().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.address.cmp(&b.address)));
    ranked.truncate(limit);
    ranked
}
