//! Comparison run orchestration
//!
//! A run flows one way through load, diff, scan, infer and report. The run is
//! synchronous; callers that need a responsive front end move the whole
//! [`RomComparison::run`] onto a worker thread and listen for [`Phase`]
//! notifications over a channel.
//!
//! # Example
//!
//! ```ignore
//! use romreloc::analysis::{AnalyzerConfig, RomComparison};
//! use romreloc::catalog::builtin_catalog;
//!
//! let config = AnalyzerConfig::builder().max_report_changes(20).build();
//! let comparison = RomComparison::load("crystal.gbc", "patched.gbc", config)?;
//! let result = comparison.run(&builtin_catalog(), &mut ());
//! println!("{} relocations", result.mappings.len());
//! ```

use std::fmt;
use std::path::Path;
use std::sync::mpsc::Sender;

use chrono::Utc;
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::address::{AddressWindow, WORK_RAM};
use crate::catalog::StructureCatalog;
use crate::diff::find_differences;
use crate::error::Result;
use crate::infer::{DEFAULT_PROBE_OFFSETS, InferenceEngine, MappingSet};
use crate::report::{AnalysisReport, DEFAULT_MAX_REPORT_CHANGES};
use crate::rom::{ImageSide, RomImage};
use crate::scanner::{CodeChange, PatternMatcher};

/// Settings for one comparison run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Smallest scan window handed to the pattern matcher
    pub min_scan_width: usize,
    /// Leading context added before each difference range
    pub context_bytes: usize,
    /// Cap on code changes listed in the report
    pub max_report_changes: usize,
    /// Run relocation inference after pattern matching
    pub deep_scan: bool,
    /// Run the advisory title check on both images
    pub verify_header: bool,
    /// Working-memory window candidates must fall into
    pub window: AddressWindow,
    /// Common-offset probes, in the order they are tried
    pub probe_offsets: Vec<i32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_scan_width: 3,
            context_bytes: 2,
            max_report_changes: DEFAULT_MAX_REPORT_CHANGES,
            deep_scan: true,
            verify_header: true,
            window: WORK_RAM,
            probe_offsets: DEFAULT_PROBE_OFFSETS.to_vec(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::default()
    }

    fn matcher(&self) -> PatternMatcher {
        PatternMatcher {
            window: self.window,
            context_bytes: self.context_bytes,
            min_scan_width: self.min_scan_width,
        }
    }
}

/// Builder for AnalyzerConfig
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfigBuilder {
    min_scan_width: Option<usize>,
    context_bytes: Option<usize>,
    max_report_changes: Option<usize>,
    deep_scan: Option<bool>,
    verify_header: Option<bool>,
    window: Option<AddressWindow>,
    probe_offsets: Option<Vec<i32>>,
}

impl AnalyzerConfigBuilder {
    pub fn min_scan_width(mut self, width: usize) -> Self {
        self.min_scan_width = Some(width);
        self
    }

    pub fn context_bytes(mut self, bytes: usize) -> Self {
        self.context_bytes = Some(bytes);
        self
    }

    pub fn max_report_changes(mut self, max: usize) -> Self {
        self.max_report_changes = Some(max);
        self
    }

    pub fn deep_scan(mut self, enabled: bool) -> Self {
        self.deep_scan = Some(enabled);
        self
    }

    pub fn verify_header(mut self, enabled: bool) -> Self {
        self.verify_header = Some(enabled);
        self
    }

    pub fn window(mut self, window: AddressWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn probe_offsets(mut self, offsets: Vec<i32>) -> Self {
        self.probe_offsets = Some(offsets);
        self
    }

    /// Build the configuration
    pub fn build(self) -> AnalyzerConfig {
        let default = AnalyzerConfig::default();
        AnalyzerConfig {
            min_scan_width: self.min_scan_width.unwrap_or(default.min_scan_width),
            context_bytes: self.context_bytes.unwrap_or(default.context_bytes),
            max_report_changes: self.max_report_changes.unwrap_or(default.max_report_changes),
            deep_scan: self.deep_scan.unwrap_or(default.deep_scan),
            verify_header: self.verify_header.unwrap_or(default.verify_header),
            window: self.window.unwrap_or(default.window),
            probe_offsets: self.probe_offsets.unwrap_or(default.probe_offsets),
        }
    }
}

/// Coarse run stage, reported once when it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Load,
    Diff,
    Scan,
    Infer,
    Report,
}

/// Receiver of phase completions
pub trait ProgressSink {
    fn phase_complete(&mut self, phase: Phase);
}

impl ProgressSink for () {
    fn phase_complete(&mut self, _phase: Phase) {}
}

impl ProgressSink for Sender<Phase> {
    fn phase_complete(&mut self, phase: Phase) {
        // a listener that went away does not stop the run
        let _ = self.send(phase);
    }
}

impl ProgressSink for Vec<Phase> {
    fn phase_complete(&mut self, phase: Phase) {
        self.push(phase);
    }
}

/// Non-fatal findings recorded during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisWarning {
    /// The advisory title check failed; `title` is empty when the image is
    /// too short to carry a header
    HeaderMismatch { image: ImageSide, title: String },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderMismatch { image, title } if title.is_empty() => {
                write!(f, "{} image has no readable cartridge header", image)
            }
            Self::HeaderMismatch { image, title } => {
                write!(f, "{} image title '{}' does not look like the target game", image, title)
            }
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub difference_count: usize,
    pub code_changes: Vec<CodeChange>,
    pub mappings: MappingSet,
    pub warnings: Vec<AnalysisWarning>,
    pub report: AnalysisReport,
    unresolved: Vec<String>,
}

impl ComparisonResult {
    /// Catalogue names with no mapping; their addresses are unknown
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}

/// One vanilla/patched image pair
#[derive(Debug, Clone)]
pub struct RomComparison {
    vanilla: RomImage,
    patched: RomImage,
    config: AnalyzerConfig,
}

impl RomComparison {
    pub fn new(vanilla: RomImage, patched: RomImage, config: AnalyzerConfig) -> Self {
        Self {
            vanilla,
            patched,
            config,
        }
    }

    /// Load both images; either failing aborts before any analysis
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        vanilla: P,
        patched: Q,
        config: AnalyzerConfig,
    ) -> Result<Self> {
        let vanilla = RomImage::load(vanilla)?;
        let patched = RomImage::load(patched)?;
        info!(
            "Loaded ROMs: vanilla {} bytes, patched {} bytes",
            vanilla.len(),
            patched.len()
        );
        Ok(Self::new(vanilla, patched, config))
    }

    pub fn vanilla(&self) -> &RomImage {
        &self.vanilla
    }

    pub fn patched(&self) -> &RomImage {
        &self.patched
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn run(&self, catalog: &StructureCatalog, sink: &mut dyn ProgressSink) -> ComparisonResult {
        let warnings = if self.config.verify_header {
            self.check_headers()
        } else {
            Vec::new()
        };
        sink.phase_complete(Phase::Load);

        let differences = find_differences(self.vanilla.bytes(), self.patched.bytes());
        info!("Found {} difference ranges", differences.len());
        sink.phase_complete(Phase::Diff);

        let code_changes =
            self.config
                .matcher()
                .scan(self.vanilla.bytes(), self.patched.bytes(), &differences);
        info!("Found {} memory-related code changes", code_changes.len());
        sink.phase_complete(Phase::Scan);

        let mappings = if self.config.deep_scan {
            let mappings = InferenceEngine::new(catalog)
                .with_window(self.config.window)
                .with_probe_offsets(self.config.probe_offsets.clone())
                .infer(&code_changes);
            sink.phase_complete(Phase::Infer);
            mappings
        } else {
            debug!("Deep scan disabled, skipping relocation inference");
            MappingSet::new()
        };

        let unresolved: Vec<String> = catalog
            .iter()
            .filter(|s| !mappings.contains(&s.name))
            .map(|s| s.name.clone())
            .collect();
        if !unresolved.is_empty() {
            debug!("Unresolved structures: {}", unresolved.join(", "));
        }

        let report = AnalysisReport::build(
            self.vanilla.name(),
            self.patched.name(),
            &mappings,
            &code_changes,
            self.config.max_report_changes,
        )
        .with_timestamp(Utc::now());
        sink.phase_complete(Phase::Report);

        ComparisonResult {
            difference_count: differences.len(),
            code_changes,
            mappings,
            warnings,
            report,
            unresolved,
        }
    }

    fn check_headers(&self) -> Vec<AnalysisWarning> {
        [
            (ImageSide::Vanilla, &self.vanilla),
            (ImageSide::Patched, &self.patched),
        ]
        .into_iter()
        .filter_map(|(side, image)| {
            let title = match image.header() {
                Some(header) if header.looks_like_target() => return None,
                Some(header) => header.title,
                None => String::new(),
            };
            let warning = AnalysisWarning::HeaderMismatch { image: side, title };
            warn!("{}", warning);
            Some(warning)
        })
        .collect()
    }
}

/// Load two images from disk and run a full comparison
pub fn compare_paths<P: AsRef<Path>, Q: AsRef<Path>>(
    vanilla: P,
    patched: Q,
    config: AnalyzerConfig,
    catalog: &StructureCatalog,
    sink: &mut dyn ProgressSink,
) -> Result<ComparisonResult> {
    let comparison = RomComparison::load(vanilla, patched, config)?;
    Ok(comparison.run(catalog, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{KnownStructure, builtin_catalog};
    use crate::infer::InferencePass;
    use crate::rom::header::TITLE_RANGE;
    use std::sync::mpsc;
    use strum::IntoEnumIterator;
    use tempfile::tempdir;

    fn rom_with_title(title: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x4000];
        bytes[TITLE_RANGE.start..TITLE_RANGE.start + title.len()].copy_from_slice(title);
        bytes
    }

    fn put_code(bytes: &mut [u8], offset: usize, code: &[u8]) {
        bytes[offset..offset + code.len()].copy_from_slice(code);
    }

    fn image_pair() -> (RomImage, RomImage) {
        let mut vanilla = rom_with_title(b"PM_CRYSTAL");
        let mut patched = vanilla.clone();
        put_code(&mut vanilla, 0x1000, &[0xFA, 0xD7, 0xDC]);
        put_code(&mut patched, 0x1000, &[0xFA, 0x17, 0xDD]);
        (
            RomImage::from_bytes("crystal.gbc", vanilla).unwrap(),
            RomImage::from_bytes("patched.gbc", patched).unwrap(),
        )
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let config = AnalyzerConfig::builder()
            .max_report_changes(10)
            .deep_scan(false)
            .build();
        assert_eq!(config.max_report_changes, 10);
        assert!(!config.deep_scan);
        assert_eq!(config.min_scan_width, 3);
        assert_eq!(config.context_bytes, 2);
        assert_eq!(config.window, WORK_RAM);
        assert_eq!(config.probe_offsets, DEFAULT_PROBE_OFFSETS.to_vec());
    }

    #[test]
    fn test_run_maps_party_count() {
        let (vanilla, patched) = image_pair();
        let comparison = RomComparison::new(vanilla, patched, AnalyzerConfig::default());
        let mut phases = Vec::new();

        let result = comparison.run(&builtin_catalog(), &mut phases);

        assert_eq!(result.difference_count, 1);
        assert_eq!(result.code_changes.len(), 1);
        assert!(result.warnings.is_empty());

        let m = result.mappings.get("party_count").unwrap();
        assert_eq!(m.patched_address, 0xDD17);
        assert_eq!(m.pass, InferencePass::DirectEvidence);
        assert!(!result.unresolved().contains(&"party_count".to_string()));
        assert!(result.unresolved().contains(&"pc_boxes".to_string()));

        assert_eq!(result.report.summary.relocations_found, result.mappings.len());
        assert_eq!(result.report.summary.vanilla_rom, "crystal.gbc");
        assert!(result.report.summary.generated_at.is_some());
        assert_eq!(phases, Phase::iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_run_without_deep_scan() {
        let (vanilla, patched) = image_pair();
        let config = AnalyzerConfig::builder().deep_scan(false).build();
        let mut phases = Vec::new();

        let result =
            RomComparison::new(vanilla, patched, config).run(&builtin_catalog(), &mut phases);

        assert_eq!(result.code_changes.len(), 1);
        assert!(result.mappings.is_empty());
        assert_eq!(result.unresolved().len(), builtin_catalog().len());
        assert!(!phases.contains(&Phase::Infer));
    }

    #[test]
    fn test_header_mismatch_is_a_warning() {
        let vanilla = RomImage::from_bytes("v", rom_with_title(b"SOMETHING")).unwrap();
        let patched = RomImage::from_bytes("p", vec![0u8; 16]).unwrap();
        let result = RomComparison::new(vanilla, patched, AnalyzerConfig::default())
            .run(&builtin_catalog(), &mut ());

        assert_eq!(
            result.warnings,
            vec![
                AnalysisWarning::HeaderMismatch {
                    image: ImageSide::Vanilla,
                    title: "SOMETHING".to_string()
                },
                AnalysisWarning::HeaderMismatch {
                    image: ImageSide::Patched,
                    title: String::new()
                },
            ]
        );
        assert_eq!(
            result.warnings[1].to_string(),
            "patched image has no readable cartridge header"
        );
    }

    #[test]
    fn test_header_check_can_be_disabled() {
        let vanilla = RomImage::from_bytes("v", vec![1u8; 16]).unwrap();
        let patched = RomImage::from_bytes("p", vec![1u8; 16]).unwrap();
        let config = AnalyzerConfig::builder().verify_header(false).build();
        let result = RomComparison::new(vanilla, patched, config).run(&builtin_catalog(), &mut ());
        assert!(result.warnings.is_empty());
        assert_eq!(result.difference_count, 0);
    }

    #[test]
    fn test_phases_over_channel() {
        let (vanilla, patched) = image_pair();
        let comparison = RomComparison::new(vanilla, patched, AnalyzerConfig::default());
        let (tx, rx) = mpsc::channel();

        let handle = std::thread::spawn(move || {
            let mut tx = tx;
            comparison.run(&builtin_catalog(), &mut tx)
        });

        let phases: Vec<Phase> = rx.iter().collect();
        let result = handle.join().unwrap();
        assert_eq!(phases.len(), 5);
        assert_eq!(phases.last(), Some(&Phase::Report));
        assert_eq!(result.mappings.get("party_count").unwrap().confidence, 0.95);
    }

    #[test]
    fn test_compare_paths_load_failure() {
        let dir = tempdir().unwrap();
        let vanilla = dir.path().join("crystal.gbc");
        std::fs::write(&vanilla, rom_with_title(b"PM_CRYSTAL")).unwrap();
        let missing = dir.path().join("missing.gbc");

        let err = compare_paths(
            &vanilla,
            &missing,
            AnalyzerConfig::default(),
            &builtin_catalog(),
            &mut (),
        )
        .unwrap_err();
        assert!(err.is_load_failure());

        let empty = dir.path().join("empty.gbc");
        std::fs::write(&empty, b"").unwrap();
        let err = compare_paths(
            &empty,
            &vanilla,
            AnalyzerConfig::default(),
            &builtin_catalog(),
            &mut (),
        )
        .unwrap_err();
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_custom_catalog() {
        let (vanilla, patched) = image_pair();
        let catalog = StructureCatalog::new(
            "custom",
            vec![KnownStructure::new("wram_probe", 0xDCF7, 1, "", None)],
        )
        .unwrap();
        let result =
            RomComparison::new(vanilla, patched, AnalyzerConfig::default()).run(&catalog, &mut ());
        // 0xDCF7 + 0x20 is the patched operand
        let m = result.mappings.get("wram_probe").unwrap();
        assert_eq!(m.patched_address, 0xDD17);
        assert_eq!(m.pass, InferencePass::CommonOffset);
    }
}
