//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use romreloc::RunMode;

use crate::commands::hex_utils::parse_hex_address;

#[derive(Parser)]
#[command(name = "romreloc")]
#[command(version, about = "Infer working-memory relocations between two ROM images")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare a vanilla and a patched ROM and infer structure relocations
    Compare {
        /// Unmodified ROM image
        vanilla: PathBuf,

        /// Patched ROM image
        patched: PathBuf,

        /// Write the JSON analysis report here
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Write the JSON address table here
        #[arg(short, long)]
        table: Option<PathBuf>,

        /// Write the Lua address module here
        #[arg(long)]
        lua: Option<PathBuf>,

        /// Address selected by table lookups
        #[arg(short, long, default_value = "patched")]
        mode: RunMode,

        /// Structure catalogue (JSON); the builtin table is used otherwise
        #[arg(long, env = "ROMRELOC_CATALOG")]
        catalog: Option<PathBuf>,

        /// Analysis settings (TOML with an [analysis] table)
        #[arg(long, default_value = "romreloc.toml")]
        config: PathBuf,

        /// Stop after pattern matching
        #[arg(long)]
        no_deep_scan: bool,
    },

    /// List byte ranges that differ between two images
    Diff {
        vanilla: PathBuf,
        patched: PathBuf,

        /// Maximum ranges to print
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Show a ROM's header and how its code references known structures
    Inspect {
        rom: PathBuf,

        /// Structure catalogue (JSON); the builtin table is used otherwise
        #[arg(long, env = "ROMRELOC_CATALOG")]
        catalog: Option<PathBuf>,

        /// Census an extra address (hex) besides the catalogue entries
        #[arg(short, long, value_parser = parse_hex_address)]
        address: Vec<u16>,

        /// Number of `LD HL,nn` targets to rank
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Print the builtin structure catalogue as JSON
    Catalog {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a structure name through an exported address table
    Lookup {
        /// JSON address table written by `compare --table`
        table: PathBuf,

        name: String,

        /// Override the table's stored mode
        #[arg(short, long)]
        mode: Option<RunMode>,

        /// Read a `compare --report` file instead of an address table
        #[arg(long)]
        report: bool,
    },
}
