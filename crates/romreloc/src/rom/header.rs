//! Cartridge header parsing
//!
//! Header layout (all offsets absolute within the image):
//!
//! ```text
//! 0x134..0x144  title (ASCII, NUL padded; overlaps game code / CGB flag)
//! 0x13F..0x143  game code
//! 0x143         CGB flag
//! 0x14C         mask ROM version
//! 0x14D         header checksum over 0x134..=0x14C
//! 0x14E..0x150  global checksum (big-endian)
//! ```
//!
//! The title check is advisory only. Patch tools routinely rewrite these
//! bytes, so a mismatch must never stop a comparison.

use std::ops::Range;

/// Substring expected in the title of the target game
pub const TITLE_SIGNATURE: &str = "CRYSTAL";
/// Game code of the target game
pub const GAME_CODE: &str = "BYTE";

pub const TITLE_RANGE: Range<usize> = 0x134..0x144;
pub const GAME_CODE_RANGE: Range<usize> = 0x13F..0x143;
pub const CGB_FLAG: usize = 0x143;
pub const VERSION: usize = 0x14C;
pub const HEADER_CHECKSUM: usize = 0x14D;
pub const GLOBAL_CHECKSUM: usize = 0x14E;
/// Minimum image length that holds a complete header
pub const HEADER_END: usize = 0x150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    pub title: String,
    pub game_code: String,
    pub cgb_flag: u8,
    pub version: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
    /// Checksum recomputed from the header bytes
    pub computed_header_checksum: u8,
}

impl RomHeader {
    /// Parse the header, or `None` if the image is too short
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_END {
            return None;
        }

        let computed_header_checksum = bytes[TITLE_RANGE.start..=VERSION]
            .iter()
            .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1));

        Some(Self {
            title: ascii_field(&bytes[TITLE_RANGE]),
            game_code: ascii_field(&bytes[GAME_CODE_RANGE]),
            cgb_flag: bytes[CGB_FLAG],
            version: bytes[VERSION],
            header_checksum: bytes[HEADER_CHECKSUM],
            global_checksum: u16::from_be_bytes([
                bytes[GLOBAL_CHECKSUM],
                bytes[GLOBAL_CHECKSUM + 1],
            ]),
            computed_header_checksum,
        })
    }

    pub fn header_checksum_valid(&self) -> bool {
        self.header_checksum == self.computed_header_checksum
    }

    /// Whether the header identifies the target game
    pub fn looks_like_target(&self) -> bool {
        self.title.to_ascii_uppercase().contains(TITLE_SIGNATURE) || self.game_code == GAME_CODE
    }
}

/// Printable ASCII with NUL padding stripped; other bytes are dropped
fn ascii_field(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .filter(|b| b.is_ascii_graphic() || **b == b' ')
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with_title(title: &[u8]) -> Vec<u8> {
        let mut rom = vec![0u8; 0x200];
        rom[TITLE_RANGE.start..TITLE_RANGE.start + title.len()].copy_from_slice(title);
        rom
    }

    #[test]
    fn test_parse_crystal_header() {
        let mut rom = image_with_title(b"PM_CRYSTAL\0BYTE");
        rom[CGB_FLAG] = 0xC0;
        rom[VERSION] = 0x00;
        rom[GLOBAL_CHECKSUM] = 0x9D;
        rom[GLOBAL_CHECKSUM + 1] = 0x0A;

        let header = RomHeader::parse(&rom).unwrap();
        assert_eq!(header.title, "PM_CRYSTAL");
        assert_eq!(header.game_code, "BYTE");
        assert_eq!(header.cgb_flag, 0xC0);
        assert_eq!(header.global_checksum, 0x9D0A);
        assert!(header.looks_like_target());
    }

    #[test]
    fn test_game_code_alone_identifies_target() {
        let rom = image_with_title(b"RANDOMIZED\0BYTE");
        let header = RomHeader::parse(&rom).unwrap();
        assert!(header.looks_like_target());
    }

    #[test]
    fn test_other_title_does_not_match() {
        let rom = image_with_title(b"POKEMON_GLDAAUE");
        let header = RomHeader::parse(&rom).unwrap();
        assert!(!header.looks_like_target());
    }

    #[test]
    fn test_short_image_has_no_header() {
        assert!(RomHeader::parse(&[0u8; 0x14F]).is_none());
    }

    #[test]
    fn test_header_checksum() {
        let mut rom = image_with_title(b"PM_CRYSTAL");
        let expected = rom[TITLE_RANGE.start..=VERSION]
            .iter()
            .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1));
        rom[HEADER_CHECKSUM] = expected;
        assert!(RomHeader::parse(&rom).unwrap().header_checksum_valid());

        rom[HEADER_CHECKSUM] = expected.wrapping_add(1);
        assert!(!RomHeader::parse(&rom).unwrap().header_checksum_valid());
    }
}
