//! Known structure catalogue
//!
//! The catalogue is fixed per target game version. It is built once at
//! startup (either the builtin table or a JSON file with the same shape) and
//! passed by reference into the inference engine.

mod signature;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::hex_u16;
use crate::error::{Error, Result};
use crate::report::write_atomic;

pub use signature::*;

/// One logical memory structure tracked across image versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownStructure {
    pub name: String,
    #[serde(with = "hex_u16")]
    pub vanilla_address: u16,
    pub size_bytes: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureKind>,
}

impl KnownStructure {
    pub fn new(
        name: &str,
        vanilla_address: u16,
        size_bytes: u32,
        description: &str,
        signature: Option<SignatureKind>,
    ) -> Self {
        Self {
            name: name.to_string(),
            vanilla_address,
            size_bytes,
            description: description.to_string(),
            signature,
        }
    }

    /// Score a candidate address with this structure's signature, if it has one
    pub fn content_score(&self, address: usize, buffer: &[u8]) -> Option<f64> {
        self.signature
            .map(|kind| kind.detector().score(address, buffer))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureCatalog {
    pub version: String,
    pub entries: Vec<KnownStructure>,
}

impl StructureCatalog {
    /// Build a catalogue, rejecting empty or duplicate names
    pub fn new<S: Into<String>>(version: S, entries: Vec<KnownStructure>) -> Result<Self> {
        let catalog = Self {
            version: version.into(),
            entries,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn entry(&self, name: &str) -> Option<&KnownStructure> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnownStructure> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.name.trim().is_empty() {
                return Err(Error::InvalidCatalog("structure with empty name".to_string()));
            }
            if !seen.insert(entry.name.to_ascii_lowercase()) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate structure name '{}'",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<StructureCatalog> {
    let content = fs::read_to_string(&path)?;
    let catalog: StructureCatalog = serde_json::from_str(&content)?;
    catalog.validate()?;
    debug!(
        "Loaded catalog {} ({} structures)",
        catalog.version,
        catalog.len()
    );
    Ok(catalog)
}

pub fn save_catalog<P: AsRef<Path>>(path: P, catalog: &StructureCatalog) -> Result<()> {
    let content = serde_json::to_string_pretty(catalog)?;
    write_atomic(path.as_ref(), &content)
}

/// Builtin catalogue for Pokémon Crystal (international release)
pub fn builtin_catalog() -> StructureCatalog {
    use SignatureKind as Sig;

    StructureCatalog {
        version: "crystal-1.0".to_string(),
        entries: vec![
            KnownStructure::new("party_count", 0xDCD7, 8, "Party Pokemon count", Some(Sig::Party)),
            KnownStructure::new("party_species", 0xDCD8, 7, "Party species list", None),
            KnownStructure::new(
                "party_data",
                0xDCDF,
                48 * 6,
                "Party Pokemon data",
                Some(Sig::Party),
            ),
            KnownStructure::new("player_id", 0xD47B, 2, "Player trainer ID", Some(Sig::Player)),
            KnownStructure::new("player_name", 0xD47D, 11, "Player name", Some(Sig::Player)),
            KnownStructure::new("current_box", 0xD8BC, 1, "Current PC box", None),
            KnownStructure::new("pc_boxes", 0xAD6C, 32 * 20 + 22, "PC Box data", Some(Sig::Box)),
            KnownStructure::new("pokedex_caught", 0xDE99, 32, "Pokedex caught flags", None),
            KnownStructure::new("pokedex_seen", 0xDEB9, 32, "Pokedex seen flags", None),
            KnownStructure::new("badges_johto", 0xD57C, 1, "Johto badges", None),
            KnownStructure::new("badges_kanto", 0xD57D, 1, "Kanto badges", None),
        ],
    }
}
