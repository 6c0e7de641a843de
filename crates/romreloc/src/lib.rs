//! # romreloc
//!
//! Relocation inference for patched Game Boy ROM images.
//!
//! Given a vanilla image and a patched image of the same game, this crate
//! finds which known working-memory structures the patch moved and where to:
//! - Byte-level difference scanning (`diff`)
//! - Address-bearing instruction matching around each difference (`scanner`)
//! - Three-pass relocation inference with per-pass confidence (`infer`)
//! - JSON reports and address tables for downstream runtimes (`report`)
//!
//! Every result is a hint derived from code patterns. A structure missing
//! from the result has an unknown address, not an unchanged one.

pub mod address;
pub mod analysis;
pub mod catalog;
pub mod diff;
pub mod error;
pub mod infer;
pub mod opcode;
pub mod prelude;
pub mod report;
pub mod rom;
pub mod scanner;

pub use address::{AddressWindow, WORK_RAM, format_address, format_offset, parse_address};
pub use analysis::{
    AnalysisWarning, AnalyzerConfig, AnalyzerConfigBuilder, ComparisonResult, Phase, ProgressSink,
    RomComparison, compare_paths,
};
pub use catalog::{
    ContentSignature, KnownStructure, SignatureKind, StructureCatalog, builtin_catalog,
    load_catalog, save_catalog,
};
pub use diff::{DifferenceRange, find_differences, scan_windows};
pub use error::{Error, Result};
pub use infer::{InferenceEngine, InferencePass, MappingSet, MemoryMapping};
pub use opcode::Encoding;
pub use report::{
    AddressTable, AnalysisReport, JsonTable, LuaModule, RunMode, TableExporter, confidence_marker,
};
pub use rom::{ImageSide, RomHeader, RomImage};
pub use scanner::{
    ChangeKind, CodeChange, InstructionObservation, PatternMatcher, PointerTarget, ROM_BANK_SIZE,
    ReferenceCensus, census_references, rank_pointer_targets,
};
