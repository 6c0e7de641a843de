//! Catalog command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use romreloc::{builtin_catalog, save_catalog};

/// Dump the builtin structure catalogue as JSON
pub fn run(output: Option<&Path>) -> Result<()> {
    let catalog = builtin_catalog();

    if let Some(path) = output {
        save_catalog(path, &catalog)
            .with_context(|| format!("Failed to write catalog {}", path.display()))?;
        eprintln!(
            "Wrote {} structures ({}) to {}",
            catalog.len(),
            catalog.version,
            path.display()
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_catalog_output_is_loadable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        run(Some(path.as_path())).unwrap();

        let loaded = romreloc::load_catalog(&path).unwrap();
        assert_eq!(loaded, builtin_catalog());
    }
}
