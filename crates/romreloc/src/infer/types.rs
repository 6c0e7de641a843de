//! Types produced by relocation inference

use strum::{Display, IntoStaticStr};

/// Inference pass that produced a mapping, strongest evidence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, IntoStaticStr)]
pub enum InferencePass {
    #[strum(serialize = "direct")]
    DirectEvidence,
    #[strum(serialize = "common-offset")]
    CommonOffset,
    #[strum(serialize = "propagation")]
    Propagation,
}

impl InferencePass {
    pub fn confidence(&self) -> f64 {
        match self {
            Self::DirectEvidence => 0.95,
            Self::CommonOffset => 0.7,
            Self::Propagation => 0.5,
        }
    }
}

/// An inferred relocation of one catalogue structure
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMapping {
    pub structure_name: String,
    pub vanilla_address: u16,
    pub patched_address: u16,
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub pass: InferencePass,
}

impl MemoryMapping {
    pub fn new(
        structure_name: &str,
        vanilla_address: u16,
        patched_address: u16,
        pass: InferencePass,
        evidence: Vec<String>,
    ) -> Self {
        Self {
            structure_name: structure_name.to_string(),
            vanilla_address,
            patched_address,
            confidence: pass.confidence(),
            evidence,
            pass,
        }
    }

    /// Signed relocation distance `patched - vanilla`
    pub fn offset(&self) -> i32 {
        i32::from(self.patched_address) - i32::from(self.vanilla_address)
    }
}

/// Mappings keyed by structure name, in insertion order.
///
/// The first mapping recorded for a name is final.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSet {
    mappings: Vec<MemoryMapping>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping unless the structure already has one.
    ///
    /// Returns `false` when an earlier mapping was kept.
    pub fn insert(&mut self, mapping: MemoryMapping) -> bool {
        if self.contains(&mapping.structure_name) {
            return false;
        }
        self.mappings.push(mapping);
        true
    }

    pub fn get(&self, name: &str) -> Option<&MemoryMapping> {
        self.mappings.iter().find(|m| m.structure_name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemoryMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Most frequent `patched - vanilla` delta; ties go to the first seen
    pub fn majority_delta(&self) -> Option<i32> {
        let mut counts: Vec<(i32, usize)> = Vec::new();
        for mapping in &self.mappings {
            let delta = mapping.offset();
            match counts.iter_mut().find(|(d, _)| *d == delta) {
                Some((_, count)) => *count += 1,
                None => counts.push((delta, 1)),
            }
        }

        let mut best: Option<(i32, usize)> = None;
        for (delta, count) in counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((delta, count));
            }
        }
        best.map(|(delta, _)| delta)
    }
}

impl<'a> IntoIterator for &'a MappingSet {
    type Item = &'a MemoryMapping;
    type IntoIter = std::slice::Iter<'a, MemoryMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}
