//! Prelude module for convenient imports
//!
//! ```ignore
//! use romreloc::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Run types: `RomComparison`, `AnalyzerConfig`, `ComparisonResult`, `Phase`
//! - Inputs: `RomImage`, `StructureCatalog`, `builtin_catalog`
//! - Results: `MappingSet`, `MemoryMapping`, `CodeChange`
//! - Exports: `AnalysisReport`, `AddressTable`, `RunMode`, `TableExporter`
//! - Error handling: `Error`, `Result`

// Run orchestration
pub use crate::analysis::{AnalyzerConfig, ComparisonResult, Phase, ProgressSink, RomComparison};

// Error handling
pub use crate::error::{Error, Result};

// Inputs
pub use crate::catalog::{KnownStructure, StructureCatalog, builtin_catalog};
pub use crate::rom::RomImage;

// Results
pub use crate::infer::{InferencePass, MappingSet, MemoryMapping};
pub use crate::scanner::CodeChange;

// Exports
pub use crate::report::{AddressTable, AnalysisReport, RunMode, TableExporter};
