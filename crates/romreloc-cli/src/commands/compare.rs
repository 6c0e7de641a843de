//! Compare command implementation.
//!
//! The comparison runs on a worker thread; phase completions arrive over a
//! channel and are printed as they happen.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result, bail};
use romreloc::{
    AddressTable, ComparisonResult, JsonTable, LuaModule, Phase, RomComparison, RunMode,
    StructureCatalog, TableExporter, builtin_catalog, load_catalog,
};
use tracing::info;

use super::summary;
use crate::config::load_config;

pub struct CompareArgs {
    pub vanilla: PathBuf,
    pub patched: PathBuf,
    pub report: Option<PathBuf>,
    pub table: Option<PathBuf>,
    pub lua: Option<PathBuf>,
    pub mode: RunMode,
    pub catalog: Option<PathBuf>,
    pub config: PathBuf,
    pub no_deep_scan: bool,
}

/// Load a catalogue file, or the builtin table when none is given
pub fn resolve_catalog(path: Option<&Path>) -> Result<StructureCatalog> {
    match path {
        Some(path) => load_catalog(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(builtin_catalog()),
    }
}

/// Run the compare command
pub fn run(args: CompareArgs) -> Result<()> {
    let mut config = load_config(&args.config);
    if args.no_deep_scan {
        config.deep_scan = false;
    }
    let change_limit = config.max_report_changes;

    let catalog = resolve_catalog(args.catalog.as_deref())?;
    info!(
        "Using catalog {} ({} structures)",
        catalog.version,
        catalog.len()
    );

    let comparison = RomComparison::load(&args.vanilla, &args.patched, config)
        .context("Failed to load ROM images")?;

    let result = run_on_worker(comparison, catalog)?;

    println!("{}", summary::render(&result, change_limit));

    let mut failures = Vec::new();
    if let Some(path) = &args.report {
        match result.report.save(path) {
            Ok(()) => println!("Report written to {}", path.display()),
            Err(e) => failures.push(
                anyhow::Error::new(e).context(format!("Failed to write report {}", path.display())),
            ),
        }
    }

    let table = AddressTable::from_mappings(&result.mappings, args.mode);
    let exports: [(&Option<PathBuf>, &dyn TableExporter); 2] = [
        (&args.table, &JsonTable as &dyn TableExporter),
        (&args.lua, &LuaModule as &dyn TableExporter),
    ];
    for (target, exporter) in exports {
        let Some(path) = target else {
            continue;
        };
        match table.save(path, exporter) {
            Ok(()) => println!(
                "{} address table written to {}",
                exporter.name(),
                path.display()
            ),
            Err(e) => failures.push(anyhow::Error::new(e).context(format!(
                "Failed to write {} table {}",
                exporter.name(),
                path.display()
            ))),
        }
    }

    if let Some(first) = failures.into_iter().next() {
        return Err(first);
    }
    Ok(())
}

fn run_on_worker(comparison: RomComparison, catalog: StructureCatalog) -> Result<ComparisonResult> {
    let (tx, rx) = mpsc::channel::<Phase>();

    let worker = thread::spawn(move || {
        let mut tx = tx;
        comparison.run(&catalog, &mut tx)
    });

    for phase in rx {
        eprintln!("  [done] {}", phase);
    }

    match worker.join() {
        Ok(result) => Ok(result),
        Err(_) => bail!("Comparison worker panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_roms(dir: &Path) -> (PathBuf, PathBuf) {
        let mut vanilla = vec![0u8; 0x2000];
        vanilla[0x134..0x13E].copy_from_slice(b"PM_CRYSTAL");
        let mut patched = vanilla.clone();
        vanilla[0x1000..0x1003].copy_from_slice(&[0xFA, 0xD7, 0xDC]);
        patched[0x1000..0x1003].copy_from_slice(&[0xFA, 0x17, 0xDD]);

        let vanilla_path = dir.join("crystal.gbc");
        let patched_path = dir.join("patched.gbc");
        std::fs::write(&vanilla_path, vanilla).unwrap();
        std::fs::write(&patched_path, patched).unwrap();
        (vanilla_path, patched_path)
    }

    fn args(dir: &Path, vanilla: PathBuf, patched: PathBuf) -> CompareArgs {
        CompareArgs {
            vanilla,
            patched,
            report: Some(dir.join("report.json")),
            table: Some(dir.join("addresses.json")),
            lua: Some(dir.join("addresses.lua")),
            mode: RunMode::Patched,
            catalog: None,
            config: dir.join("romreloc.toml"),
            no_deep_scan: false,
        }
    }

    #[test]
    fn test_compare_writes_exports() {
        let dir = tempdir().unwrap();
        let (vanilla, patched) = write_roms(dir.path());

        run(args(dir.path(), vanilla, patched)).unwrap();

        let report = romreloc::AnalysisReport::load(dir.path().join("report.json")).unwrap();
        assert_eq!(report.relocations["party_count"].patched_address, 0xDD17);

        let table = AddressTable::load(dir.path().join("addresses.json")).unwrap();
        assert_eq!(table.lookup("party_count").unwrap(), 0xDD17);

        let lua = std::fs::read_to_string(dir.path().join("addresses.lua")).unwrap();
        assert!(lua.contains("patched = 0xDD17"));
    }

    #[test]
    fn test_compare_reports_export_failure() {
        let dir = tempdir().unwrap();
        let (vanilla, patched) = write_roms(dir.path());
        let mut args = args(dir.path(), vanilla, patched);
        args.report = Some(dir.path().join("missing").join("report.json"));

        let err = run(args).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to write report"));
        // later exports still ran
        assert!(dir.path().join("addresses.json").exists());
    }

    #[test]
    fn test_compare_missing_rom_fails() {
        let dir = tempdir().unwrap();
        let (vanilla, _) = write_roms(dir.path());
        let args = args(dir.path(), vanilla, dir.path().join("nope.gbc"));
        assert!(run(args).is_err());
        assert!(!dir.path().join("report.json").exists());
    }

    #[test]
    fn test_resolve_catalog_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        romreloc::save_catalog(&path, &builtin_catalog()).unwrap();

        assert_eq!(resolve_catalog(Some(path.as_path())).unwrap(), builtin_catalog());
        assert!(resolve_catalog(Some(dir.path().join("missing.json").as_path())).is_err());
    }
}
