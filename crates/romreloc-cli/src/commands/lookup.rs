//! Lookup command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use romreloc::{AddressTable, AnalysisReport, RunMode, format_address};

/// Resolve `name` and print its address
pub fn run(source: &Path, name: &str, mode: Option<RunMode>, report: bool) -> Result<()> {
    let address = resolve(source, name, mode, report)?;
    println!("{}", format_address(address));
    Ok(())
}

/// Load an address table, or build one from a `compare --report` file
fn load_table(source: &Path, report: bool) -> romreloc::Result<AddressTable> {
    if report {
        let report = AnalysisReport::load(source)?;
        Ok(AddressTable::from_report(&report, RunMode::default()))
    } else {
        AddressTable::load(source)
    }
}

pub fn resolve(source: &Path, name: &str, mode: Option<RunMode>, report: bool) -> Result<u16> {
    let kind = if report { "report" } else { "address table" };
    let mut table = match load_table(source, report) {
        Ok(table) => table,
        Err(e) if e.is_not_found() => {
            bail!("No {} at {}; run `compare` to write one", kind, source.display())
        }
        Err(e) => bail!("Failed to load {} {}: {}", kind, source.display(), e),
    };
    if let Some(mode) = mode {
        table = table.with_mode(mode);
    }
    match table.lookup(name) {
        Ok(address) => Ok(address),
        Err(e) => bail!("No address for '{}' in {}: {}", name, source.display(), e),
    }
}
