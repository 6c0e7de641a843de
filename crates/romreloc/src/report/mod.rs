//! Report and address-table export
//!
//! Everything here is a pure function of a finished comparison. Writers
//! return errors to the caller and never leave a partially written file
//! behind.

mod table;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::address::{format_address, format_offset, hex_u16};
use crate::error::Result;
use crate::infer::MappingSet;
use crate::scanner::CodeChange;

pub use table::{AddressTable, JsonTable, LuaModule, RunMode, TableEntry, TableExporter};

/// Code changes kept in a report unless configured otherwise
pub const DEFAULT_MAX_REPORT_CHANGES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub vanilla_rom: String,
    pub patched_rom: String,
    pub relocations_found: usize,
    /// Total code changes found, including those cut from the listing
    pub code_changes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelocationEntry {
    #[serde(with = "hex_u16")]
    pub vanilla_address: u16,
    #[serde(with = "hex_u16")]
    pub patched_address: u16,
    pub offset: i32,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub offset: String,
    pub instruction: String,
    pub addresses: Vec<String>,
}

impl From<&CodeChange> for ChangeEntry {
    fn from(change: &CodeChange) -> Self {
        Self {
            offset: format_offset(change.offset),
            instruction: change.instruction().to_string(),
            addresses: change
                .affected_addresses
                .iter()
                .map(|&a| format_address(a))
                .collect(),
        }
    }
}

/// Structured result of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: ReportSummary,
    pub relocations: BTreeMap<String, RelocationEntry>,
    pub code_changes: Vec<ChangeEntry>,
}

impl AnalysisReport {
    pub fn build(
        vanilla_rom: &str,
        patched_rom: &str,
        mappings: &MappingSet,
        changes: &[CodeChange],
        max_changes: usize,
    ) -> Self {
        let relocations = mappings
            .iter()
            .map(|m| {
                (
                    m.structure_name.clone(),
                    RelocationEntry {
                        vanilla_address: m.vanilla_address,
                        patched_address: m.patched_address,
                        offset: m.offset(),
                        confidence: m.confidence,
                        evidence: m.evidence.clone(),
                    },
                )
            })
            .collect();

        Self {
            summary: ReportSummary {
                vanilla_rom: vanilla_rom.to_string(),
                patched_rom: patched_rom.to_string(),
                relocations_found: mappings.len(),
                code_changes: changes.len(),
                generated_at: None,
            },
            relocations,
            code_changes: changes.iter().take(max_changes).map(ChangeEntry::from).collect(),
        }
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.summary.generated_at = Some(generated_at);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, &self.to_json()?)?;
        info!("Saved analysis report to {}", path.display());
        Ok(())
    }

    /// `(name, vanilla, patched, confidence)` per relocation, in name order
    pub fn mapping_tuples(&self) -> Vec<(String, u16, u16, f64)> {
        self.relocations
            .iter()
            .map(|(name, r)| (name.clone(), r.vanilla_address, r.patched_address, r.confidence))
            .collect()
    }
}

/// Display marker for a confidence level
pub fn confidence_marker(confidence: f64) -> &'static str {
    if confidence >= 0.9 {
        "✓"
    } else if confidence >= 0.7 {
        "?"
    } else {
        "!"
    }
}

/// Write `content` next to `path` first, then rename it into place
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");

    if let Err(e) = fs::write(&staging, content) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::{InferencePass, MemoryMapping};
    use crate::opcode::Encoding;
    use crate::scanner::ChangeKind;
    use tempfile::tempdir;

    fn sample_mappings() -> MappingSet {
        let mut set = MappingSet::new();
        set.insert(MemoryMapping::new(
            "party_count",
            0xDCD7,
            0xDD17,
            InferencePass::DirectEvidence,
            vec!["Found in LD A,(nn) at 0x001000".to_string()],
        ));
        set.insert(MemoryMapping::new(
            "current_box",
            0xD8BC,
            0xD89C,
            InferencePass::CommonOffset,
            vec!["Common offset pattern (-32)".to_string()],
        ));
        set
    }

    fn sample_change(offset: usize) -> CodeChange {
        CodeChange {
            offset,
            vanilla_bytes: vec![0xFA, 0xD7, 0xDC],
            patched_bytes: vec![0xFA, 0x17, 0xDD],
            encoding: Encoding::LdAFromMem,
            kind: ChangeKind::OperandChanged,
            affected_addresses: vec![0xDCD7, 0xDD17],
        }
    }

    #[test]
    fn test_report_layout() {
        let report = AnalysisReport::build(
            "crystal.gbc",
            "patched.gbc",
            &sample_mappings(),
            &[sample_change(0x1000)],
            DEFAULT_MAX_REPORT_CHANGES,
        );
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["summary"]["vanilla_rom"], "crystal.gbc");
        assert_eq!(value["summary"]["relocations_found"], 2);
        assert_eq!(value["summary"]["code_changes"], 1);
        assert!(value["summary"].get("generated_at").is_none());

        let party = &value["relocations"]["party_count"];
        assert_eq!(party["vanilla_address"], "0xDCD7");
        assert_eq!(party["patched_address"], "0xDD17");
        assert_eq!(party["offset"], 64);
        assert_eq!(party["confidence"], 0.95);
        assert_eq!(value["relocations"]["current_box"]["offset"], -32);

        let change = &value["code_changes"][0];
        assert_eq!(change["offset"], "0x001000");
        assert_eq!(change["instruction"], "LD A,(nn)");
        assert_eq!(change["addresses"], serde_json::json!(["0xDCD7", "0xDD17"]));
    }

    #[test]
    fn test_code_changes_capped() {
        let changes: Vec<_> = (0..80).map(|i| sample_change(0x1000 + i * 3)).collect();
        let report = AnalysisReport::build("a", "b", &MappingSet::new(), &changes, 50);
        assert_eq!(report.code_changes.len(), 50);
        assert_eq!(report.summary.code_changes, 80);
        assert_eq!(report.code_changes[49].offset, "0x001093");
    }

    #[test]
    fn test_round_trip_preserves_mapping_tuples() {
        let report = AnalysisReport::build("a", "b", &sample_mappings(), &[], 50)
            .with_timestamp(Utc::now());
        let parsed = AnalysisReport::from_json(&report.to_json().unwrap()).unwrap();

        assert_eq!(parsed.mapping_tuples(), report.mapping_tuples());
        assert_eq!(
            parsed.mapping_tuples(),
            vec![
                ("current_box".to_string(), 0xD8BC, 0xD89C, 0.7),
                ("party_count".to_string(), 0xDCD7, 0xDD17, 0.95),
            ]
        );
        assert!(parsed.summary.generated_at.is_some());
    }

    #[test]
    fn test_parse_tolerates_missing_timestamp() {
        let text = r#"{
            "summary": {"vanilla_rom": "a", "patched_rom": "b", "relocations_found": 0, "code_changes": 0},
            "relocations": {},
            "code_changes": []
        }"#;
        let report = AnalysisReport::from_json(text).unwrap();
        assert!(report.summary.generated_at.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = AnalysisReport::build("a", "b", &sample_mappings(), &[], 50);

        report.save(&path).unwrap();
        assert!(!dir.path().join("report.json.tmp").exists());
        assert_eq!(AnalysisReport::load(&path).unwrap(), report);
    }

    #[test]
    fn test_failed_save_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let report = AnalysisReport::build("a", "b", &MappingSet::new(), &[], 50);

        assert!(report.save(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_confidence_marker() {
        assert_eq!(confidence_marker(0.95), "✓");
        assert_eq!(confidence_marker(0.7), "?");
        assert_eq!(confidence_marker(0.5), "!");
    }
}
