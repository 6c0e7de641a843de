//! Content signatures for corroborating candidate addresses
//!
//! A signature scores how plausible it is that a memory snapshot holds a
//! given structure at a given address. Scores are heuristics with their own
//! false-positive rate; the inference engine never requires them.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Highest valid species index
pub const MAX_SPECIES: u8 = 251;
/// Party capacity
pub const MAX_PARTY_SIZE: u8 = 6;
/// PC box capacity
pub const MAX_BOX_SIZE: u8 = 20;

pub trait ContentSignature: fmt::Debug + Send + Sync {
    /// Plausibility in `[0, 1]` that `buffer` holds the structure at `address`
    fn score(&self, address: usize, buffer: &[u8]) -> f64;
}

/// Party block: count byte (1-6) followed by species IDs
#[derive(Debug, Clone, Copy, Default)]
pub struct PartySignature;

impl ContentSignature for PartySignature {
    fn score(&self, address: usize, buffer: &[u8]) -> f64 {
        let Some(block) = buffer.get(address..address.saturating_add(8)) else {
            return 0.0;
        };

        let count = block[0];
        if !(1..=MAX_PARTY_SIZE).contains(&count) {
            return 0.0;
        }

        let plausible_species = block[1..=usize::from(count)]
            .iter()
            .filter(|&&species| (1..=MAX_SPECIES).contains(&species))
            .count();

        (0.5 + 0.08 * plausible_species as f64).min(1.0)
    }
}

/// PC box: count byte (0-20) heading a 22-byte species list
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxSignature;

impl ContentSignature for BoxSignature {
    fn score(&self, address: usize, buffer: &[u8]) -> f64 {
        let Some(block) = buffer.get(address..address.saturating_add(22)) else {
            return 0.0;
        };
        if block[0] > MAX_BOX_SIZE { 0.0 } else { 0.5 }
    }
}

/// Player block: trainer ID followed by the name
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerSignature;

impl ContentSignature for PlayerSignature {
    fn score(&self, address: usize, buffer: &[u8]) -> f64 {
        let Some(block) = buffer.get(address..address.saturating_add(13)) else {
            return 0.0;
        };
        match u16::from_le_bytes([block[0], block[1]]) {
            0 | 0xFFFF => 0.0,
            _ => 0.5,
        }
    }
}

/// Signature selector as stored in catalogue files
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SignatureKind {
    Party,
    Box,
    Player,
}

impl SignatureKind {
    pub fn detector(&self) -> &'static dyn ContentSignature {
        match self {
            Self::Party => &PartySignature,
            Self::Box => &BoxSignature,
            Self::Player => &PlayerSignature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_signature_scores_species() {
        let mut mem = vec![0u8; 32];
        mem[4..12].copy_from_slice(&[3, 155, 158, 0xFF, 0, 0, 0, 0]);
        // count 3, two plausible species, one terminator-like value
        let score = PartySignature.score(4, &mem);
        assert!((score - 0.66).abs() < 1e-9);
    }

    #[test]
    fn test_party_signature_caps_at_one() {
        let mem = [6u8, 1, 2, 3, 4, 5, 6, 0xFF];
        let score = PartySignature.score(0, &mem);
        assert!((score - 0.98).abs() < 1e-9);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_party_signature_rejects_bad_count_and_short_buffer() {
        assert_eq!(PartySignature.score(0, &[0u8; 8]), 0.0);
        assert_eq!(PartySignature.score(0, &[7u8, 1, 1, 1, 1, 1, 1, 1]), 0.0);
        assert_eq!(PartySignature.score(2, &[1u8; 9]), 0.0);
    }

    #[test]
    fn test_box_signature() {
        let mut mem = vec![0u8; 22];
        mem[0] = 20;
        assert_eq!(BoxSignature.score(0, &mem), 0.5);
        mem[0] = 21;
        assert_eq!(BoxSignature.score(0, &mem), 0.0);
        assert_eq!(BoxSignature.score(1, &mem), 0.0);
    }

    #[test]
    fn test_player_signature() {
        let mut mem = vec![0u8; 13];
        assert_eq!(PlayerSignature.score(0, &mem), 0.0);
        mem[0] = 0x39;
        mem[1] = 0x30;
        assert_eq!(PlayerSignature.score(0, &mem), 0.5);
        mem[0] = 0xFF;
        mem[1] = 0xFF;
        assert_eq!(PlayerSignature.score(0, &mem), 0.0);
    }

    #[test]
    fn test_signature_kind_parse_and_dispatch() {
        let kind: SignatureKind = "party".parse().unwrap();
        assert_eq!(kind, SignatureKind::Party);
        assert_eq!(SignatureKind::Player.to_string(), "player");
        let score = kind.detector().score(0, &[1, 25, 0, 0, 0, 0, 0, 0]);
        assert!((score - 0.58).abs() < 1e-9);
    }
}
