//! Analysis settings file.
//!
//! ```toml
//! [analysis]
//! min_scan_width = 3
//! context_bytes = 2
//! max_report_changes = 50
//! deep_scan = true
//! verify_header = true
//! window = ["0xC000", "0xE000"]
//! probe_offsets = [32, 64, 128, 256, -32, -64, -128, -256]
//! ```
//!
//! Every key is optional; missing keys keep the library defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use romreloc::{AddressWindow, AnalyzerConfig, format_address};
use serde::Deserialize;
use tracing::{info, warn};

use crate::commands::hex_utils::parse_hex_address;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    analysis: AnalysisSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalysisSection {
    min_scan_width: Option<usize>,
    context_bytes: Option<usize>,
    max_report_changes: Option<usize>,
    deep_scan: Option<bool>,
    verify_header: Option<bool>,
    window: Option<[String; 2]>,
    probe_offsets: Option<Vec<i32>>,
}

impl AnalysisSection {
    fn into_config(self) -> Result<AnalyzerConfig> {
        let mut builder = AnalyzerConfig::builder();
        if let Some(width) = self.min_scan_width {
            builder = builder.min_scan_width(width);
        }
        if let Some(bytes) = self.context_bytes {
            builder = builder.context_bytes(bytes);
        }
        if let Some(max) = self.max_report_changes {
            builder = builder.max_report_changes(max);
        }
        if let Some(enabled) = self.deep_scan {
            builder = builder.deep_scan(enabled);
        }
        if let Some(enabled) = self.verify_header {
            builder = builder.verify_header(enabled);
        }
        if let Some([start, end]) = self.window {
            let start = parse_hex_address(&start).context("Invalid window start")?;
            let end = parse_hex_address(&end).context("Invalid window end")?;
            if start >= end {
                bail!(
                    "window start {} must be below end {}",
                    format_address(start),
                    format_address(end)
                );
            }
            builder = builder.window(AddressWindow::new(u32::from(start), u32::from(end)));
        }
        if let Some(offsets) = self.probe_offsets {
            builder = builder.probe_offsets(offsets);
        }
        Ok(builder.build())
    }
}

/// Parse settings text
pub fn parse_config(content: &str) -> Result<AnalyzerConfig> {
    let file: ConfigFile = toml::from_str(content).context("Failed to parse config")?;
    file.analysis.into_config()
}

/// Load settings, falling back to defaults when the file is missing or broken
pub fn load_config(path: &Path) -> AnalyzerConfig {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to load config {}: {}, using defaults", path.display(), e);
            return AnalyzerConfig::default();
        }
    };

    match parse_config(&content) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{:#}, using defaults", e);
            AnalyzerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), AnalyzerConfig::default());
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = parse_config(
            r#"
            [analysis]
            max_report_changes = 10
            deep_scan = false
            window = ["0xD000", "0xE000"]
            probe_offsets = [16, -16]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_report_changes, 10);
        assert!(!config.deep_scan);
        assert_eq!(config.window, AddressWindow::new(0xD000, 0xE000));
        assert_eq!(config.probe_offsets, vec![16, -16]);
        assert_eq!(config.min_scan_width, 3);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse_config("[analysis]\nmax_changes = 10\n").is_err());
        assert!(parse_config("[analysis]\nwindow = [\"0xC000\", \"zz\"]\n").is_err());
    }

    #[test]
    fn test_empty_window_rejected() {
        let err = parse_config("[analysis]\nwindow = [\"0xE000\", \"0xC000\"]\n").unwrap_err();
        assert_eq!(err.to_string(), "window start 0xE000 must be below end 0xC000");
        assert!(parse_config("[analysis]\nwindow = [\"0xD000\", \"0xD000\"]\n").is_err());
        assert!(parse_config("[analysis]\nwindow = [\"0xD000\", \"0xD001\"]\n").is_ok());
    }

    #[test]
    fn test_load_config_falls_back() {
        let missing = Path::new("definitely-missing-romreloc.toml");
        assert_eq!(load_config(missing), AnalyzerConfig::default());

        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[analysis\n").unwrap();
        assert_eq!(load_config(file.path()), AnalyzerConfig::default());

        std::fs::write(file.path(), "[analysis]\ncontext_bytes = 4\n").unwrap();
        assert_eq!(load_config(file.path()).context_bytes, 4);
    }
}
