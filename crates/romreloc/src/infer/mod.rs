//! Relocation inference
//!
//! Three passes run strictly in order and a structure leaves the pipeline
//! as soon as one of them maps it:
//!
//! 1. Direct evidence: a code change whose operands include the vanilla
//!    address names the patched address next to it.
//! 2. Common offset: the vanilla address shifted by a small fixed probe
//!    shows up in some code change.
//! 3. Propagation: the majority delta of the mappings found so far is
//!    applied to every structure still unmapped (needs two or more).
//!
//! Structures no pass can place are simply absent from the result. Absence
//! means "unknown", never "unchanged".

mod types;

use tracing::{debug, info};

use crate::address::{AddressWindow, WORK_RAM, format_offset};
use crate::catalog::{KnownStructure, StructureCatalog};
use crate::scanner::CodeChange;

pub use types::*;

/// Pass B probe order
pub const DEFAULT_PROBE_OFFSETS: [i32; 8] = [0x20, 0x40, 0x80, 0x100, -0x20, -0x40, -0x80, -0x100];

/// Minimum number of existing mappings before propagation runs
pub const MIN_MAPPINGS_FOR_PROPAGATION: usize = 2;

pub struct InferenceEngine<'a> {
    catalog: &'a StructureCatalog,
    window: AddressWindow,
    probe_offsets: Vec<i32>,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(catalog: &'a StructureCatalog) -> Self {
        Self {
            catalog,
            window: WORK_RAM,
            probe_offsets: DEFAULT_PROBE_OFFSETS.to_vec(),
        }
    }

    pub fn with_window(mut self, window: AddressWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_probe_offsets(mut self, probe_offsets: Vec<i32>) -> Self {
        self.probe_offsets = probe_offsets;
        self
    }

    /// Run all three passes over the code changes of one comparison
    pub fn infer(&self, changes: &[CodeChange]) -> MappingSet {
        let mut mappings = MappingSet::new();

        let direct = self.direct_evidence_pass(changes, &mut mappings);
        debug!("Direct evidence pass: {} mappings", direct);

        let probed = self.common_offset_pass(changes, &mut mappings);
        debug!("Common offset pass: {} mappings", probed);

        let propagated = self.propagation_pass(&mut mappings);
        debug!("Propagation pass: {} mappings", propagated);

        info!(
            "Inferred {} of {} structures ({} direct, {} common offset, {} propagated)",
            mappings.len(),
            self.catalog.len(),
            direct,
            probed,
            propagated
        );
        mappings
    }

    fn unresolved<'m>(
        &'m self,
        mappings: &'m MappingSet,
    ) -> impl Iterator<Item = &'a KnownStructure> + 'm {
        self.catalog
            .entries
            .iter()
            .filter(move |s| !mappings.contains(&s.name))
    }

    /// Pass A: the operand that follows the vanilla address in a change
    /// (wrapping to the first) is taken as the patched address.
    pub fn direct_evidence_pass(&self, changes: &[CodeChange], mappings: &mut MappingSet) -> usize {
        let mut found = Vec::new();

        for structure in self.unresolved(mappings) {
            let vanilla = structure.vanilla_address;
            let hit = changes.iter().find_map(|change| {
                let idx = change.affected_addresses.iter().position(|&a| a == vanilla)?;
                let next = change
                    .affected_addresses
                    .get(idx + 1)
                    .or_else(|| change.affected_addresses.first())
                    .copied()?;
                (next != vanilla && self.window.contains(next)).then_some((change, next))
            });

            if let Some((change, patched)) = hit {
                found.push(MemoryMapping::new(
                    &structure.name,
                    vanilla,
                    patched,
                    InferencePass::DirectEvidence,
                    vec![format!(
                        "Found in {} at {}",
                        change.instruction(),
                        format_offset(change.offset)
                    )],
                ));
            }
        }

        insert_all(mappings, found)
    }

    /// Pass B: probe small fixed offsets around the vanilla address
    pub fn common_offset_pass(&self, changes: &[CodeChange], mappings: &mut MappingSet) -> usize {
        let mut found = Vec::new();

        for structure in self.unresolved(mappings) {
            let vanilla = structure.vanilla_address;
            let hit = self.probe_offsets.iter().find_map(|&delta| {
                let candidate = self.window.offset_within(vanilla, delta)?;
                if candidate == vanilla {
                    return None;
                }
                let change = changes.iter().find(|c| c.references(candidate))?;
                Some((delta, candidate, change))
            });

            if let Some((delta, patched, change)) = hit {
                found.push(MemoryMapping::new(
                    &structure.name,
                    vanilla,
                    patched,
                    InferencePass::CommonOffset,
                    vec![
                        format!("Common offset pattern ({:+})", delta),
                        format!(
                            "Candidate referenced by {} at {}",
                            change.instruction(),
                            format_offset(change.offset)
                        ),
                    ],
                ));
            }
        }

        insert_all(mappings, found)
    }

    /// Pass C: apply the majority delta to every structure still unmapped
    pub fn propagation_pass(&self, mappings: &mut MappingSet) -> usize {
        if mappings.len() < MIN_MAPPINGS_FOR_PROPAGATION {
            return 0;
        }
        let Some(delta) = mappings.majority_delta() else {
            return 0;
        };
        let basis = mappings.len();

        let mut found = Vec::new();
        for structure in self.unresolved(mappings) {
            let vanilla = structure.vanilla_address;
            match self.window.offset_within(vanilla, delta) {
                Some(patched) => found.push(MemoryMapping::new(
                    &structure.name,
                    vanilla,
                    patched,
                    InferencePass::Propagation,
                    vec![format!(
                        "Heuristic: common offset pattern ({:+}) from {} resolved structures",
                        delta, basis
                    )],
                )),
                None => debug!(
                    "{}: propagated delta {:+} leaves working memory",
                    structure.name, delta
                ),
            }
        }

        insert_all(mappings, found)
    }
}

fn insert_all(mappings: &mut MappingSet, found: Vec<MemoryMapping>) -> usize {
    found
        .into_iter()
        .filter(|mapping| mappings.insert(mapping.clone()))
        .count()
}
