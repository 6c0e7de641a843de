//! ROM image loading
//!
//! A comparison run owns exactly two images (vanilla and patched). Both are
//! read once and never mutated afterwards.

pub mod header;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub use header::{RomHeader, TITLE_SIGNATURE};

/// Which side of a comparison an image (or an observation) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ImageSide {
    Vanilla,
    Patched,
}

/// An immutable ROM image
#[derive(Debug, Clone)]
pub struct RomImage {
    name: String,
    bytes: Vec<u8>,
}

impl RomImage {
    /// Wrap an in-memory buffer. Empty buffers are rejected.
    pub fn from_bytes<S: Into<String>>(name: S, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(Error::EmptyImage(name));
        }
        Ok(Self { name, bytes })
    }

    /// Read an image from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::LoadFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(path.display().to_string(), bytes)
    }

    /// Source identifier (file path or caller-supplied name)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    /// Little-endian 16-bit value at `offset`, if both bytes exist
    pub fn read_u16_le(&self, offset: usize) -> Option<u16> {
        read_u16_le(&self.bytes, offset)
    }

    /// Parsed cartridge header, if the image is long enough to hold one
    pub fn header(&self) -> Option<RomHeader> {
        RomHeader::parse(&self.bytes)
    }
}

pub(crate) fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let lo = *bytes.get(offset)?;
    let hi = *bytes.get(offset.checked_add(1)?)?;
    Some(u16::from_le_bytes([lo, hi]))
}
