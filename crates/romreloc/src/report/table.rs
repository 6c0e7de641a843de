//! Address table for downstream runtimes
//!
//! The table maps a structure name to its vanilla and patched addresses and
//! carries one mode selector. Lookups of unknown names are errors; there is
//! no fallback address.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::info;

use super::{AnalysisReport, write_atomic};
use crate::address::{format_address, hex_u16};
use crate::error::{Error, Result};
use crate::infer::MappingSet;

/// Which address a table lookup resolves to
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RunMode {
    Vanilla,
    #[default]
    Patched,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(with = "hex_u16")]
    pub vanilla: u16,
    #[serde(with = "hex_u16")]
    pub patched: u16,
    pub confidence: f64,
}

impl TableEntry {
    pub fn address(&self, mode: RunMode) -> u16 {
        match mode {
            RunMode::Vanilla => self.vanilla,
            RunMode::Patched => self.patched,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressTable {
    pub mode: RunMode,
    pub entries: BTreeMap<String, TableEntry>,
}

impl AddressTable {
    pub fn from_mappings(mappings: &MappingSet, mode: RunMode) -> Self {
        let entries = mappings
            .iter()
            .map(|m| {
                (
                    m.structure_name.clone(),
                    TableEntry {
                        vanilla: m.vanilla_address,
                        patched: m.patched_address,
                        confidence: m.confidence,
                    },
                )
            })
            .collect();
        Self { mode, entries }
    }

    pub fn from_report(report: &AnalysisReport, mode: RunMode) -> Self {
        let entries = report
            .relocations
            .iter()
            .map(|(name, r)| {
                (
                    name.clone(),
                    TableEntry {
                        vanilla: r.vanilla_address,
                        patched: r.patched_address,
                        confidence: r.confidence,
                    },
                )
            })
            .collect();
        Self { mode, entries }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn entry(&self, name: &str) -> Option<&TableEntry> {
        self.entries.get(name)
    }

    /// Resolve `name` for the table's mode
    pub fn lookup(&self, name: &str) -> Result<u16> {
        self.entry(name)
            .map(|e| e.address(self.mode))
            .ok_or_else(|| Error::UnknownStructure(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, exporter: &dyn TableExporter) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, &exporter.render(self)?)?;
        info!(
            "Saved {} address table ({} entries) to {}",
            exporter.name(),
            self.len(),
            path.display()
        );
        Ok(())
    }
}

/// Output format for an address table
pub trait TableExporter {
    /// Short format name for logs
    fn name(&self) -> &'static str;

    fn render(&self, table: &AddressTable) -> Result<String>;
}

/// The table as JSON, readable back with [`AddressTable::load`]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTable;

impl TableExporter for JsonTable {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, table: &AddressTable) -> Result<String> {
        Ok(serde_json::to_string_pretty(table)?)
    }
}

/// The table as a Lua module exposing `rom_type`, `mappings` and `get(name)`
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaModule;

impl TableExporter for LuaModule {
    fn name(&self) -> &'static str {
        "lua"
    }

    fn render(&self, table: &AddressTable) -> Result<String> {
        let mut out = String::new();
        out.push_str("-- Memory addresses inferred by romreloc\n\n");
        out.push_str("local addresses = {}\n\n");
        out.push_str(&format!("addresses.rom_type = \"{}\"\n\n", table.mode));

        out.push_str("addresses.mappings = {\n");
        for (name, entry) in &table.entries {
            out.push_str(&format!("    [\"{}\"] = {{\n", lua_escape(name)));
            out.push_str(&format!("        vanilla = {},\n", format_address(entry.vanilla)));
            out.push_str(&format!("        patched = {},\n", format_address(entry.patched)));
            out.push_str(&format!("        confidence = {:.2}\n", entry.confidence));
            out.push_str("    },\n");
        }
        out.push_str("}\n\n");

        out.push_str(
            r#"function addresses.get(name)
    local mapping = addresses.mappings[name]
    if not mapping then
        error("Unknown address: " .. tostring(name))
    end

    if addresses.rom_type == "patched" then
        return mapping.patched
    else
        return mapping.vanilla
    end
end

return addresses
"#,
        );
        Ok(out)
    }
}

fn lua_escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
