//! Hex parsing and formatting helpers for command arguments and output.

use anyhow::Result;

/// Parse a 16-bit hex address (with or without 0x prefix).
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_hex_address("0xDCD7").unwrap(), 0xDCD7);
/// assert_eq!(parse_hex_address("dcd7").unwrap(), 0xDCD7);
/// ```
pub fn parse_hex_address(s: &str) -> Result<u16> {
    romreloc::parse_address(s).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}

/// Format bytes as space-separated hex pairs (`FA D7 DC`)
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a signed offset the way the summary prints it (`+64`, `-32`)
pub fn format_signed(offset: i32) -> String {
    format!("{:+}", offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_address_with_prefix() {
        assert_eq!(parse_hex_address("0xDCD7").unwrap(), 0xDCD7);
        assert_eq!(parse_hex_address("0Xdcd7").unwrap(), 0xDCD7);
    }

    #[test]
    fn test_parse_hex_address_without_prefix() {
        assert_eq!(parse_hex_address("C000").unwrap(), 0xC000);
    }

    #[test]
    fn test_parse_hex_address_invalid() {
        assert!(parse_hex_address("GHIJK").is_err());
        assert!(parse_hex_address("0x10000").is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(&[0xFA, 0xD7, 0xDC]), "FA D7 DC");
        assert_eq!(format_bytes(&[]), "");
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(64), "+64");
        assert_eq!(format_signed(-32), "-32");
        assert_eq!(format_signed(0), "+0");
    }
}
