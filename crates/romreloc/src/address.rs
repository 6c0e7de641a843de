//! Working-memory window and address text helpers

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Half-open address interval `[start, end)` of the target's working memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressWindow {
    pub start: u32,
    pub end: u32,
}

/// WRAM on the target platform
pub const WORK_RAM: AddressWindow = AddressWindow {
    start: 0xC000,
    end: 0xE000,
};

impl Default for AddressWindow {
    fn default() -> Self {
        WORK_RAM
    }
}

impl AddressWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, address: u16) -> bool {
        (self.start..self.end).contains(&u32::from(address))
    }

    /// Apply a signed delta and keep the result only if it lands in the window.
    ///
    /// Results outside the 16-bit space are rejected, never wrapped or clamped.
    pub fn offset_within(&self, address: u16, delta: i32) -> Option<u16> {
        let target = i64::from(address) + i64::from(delta);
        let target = u16::try_from(target).ok()?;
        self.contains(target).then_some(target)
    }
}

/// Format a 16-bit address the way reports print it (`0xDCD7`)
pub fn format_address(address: u16) -> String {
    format!("0x{:04X}", address)
}

/// Format an image offset the way reports print it (`0x001000`)
pub fn format_offset(offset: usize) -> String {
    format!("0x{:06X}", offset)
}

/// Parse a hex address string (with or without 0x prefix)
pub fn parse_address(s: &str) -> Result<u16> {
    let digits = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| Error::InvalidAddress(format!("{}: {}", s, e)))
}

/// Serde adapter storing a `u16` address as `"0xHHHH"` text
pub mod hex_u16 {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(address: &u16, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_address(*address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_address(&text).map_err(de::Error::custom)
    }
}
