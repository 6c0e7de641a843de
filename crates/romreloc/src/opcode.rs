//! Memory-referencing instruction encodings
//!
//! Only the opcodes that touch memory by address are catalogued. The 3-byte
//! forms carry a little-endian 16-bit operand right after the opcode; the
//! 1-byte `(HL+)`/`(HL-)` forms are kept so they are recognised, but they
//! carry no address.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum Encoding {
    #[strum(serialize = "LD BC,nn")]
    LdBcImm = 0x01,
    #[strum(serialize = "LD (nn),SP")]
    LdMemFromSp = 0x08,
    #[strum(serialize = "LD DE,nn")]
    LdDeImm = 0x11,
    #[strum(serialize = "LD HL,nn")]
    LdHlImm = 0x21,
    #[strum(serialize = "LD (HL+),A")]
    LdHlIncFromA = 0x22,
    #[strum(serialize = "LD A,(HL+)")]
    LdAFromHlInc = 0x2A,
    #[strum(serialize = "LD SP,nn")]
    LdSpImm = 0x31,
    #[strum(serialize = "LD (HL-),A")]
    LdHlDecFromA = 0x32,
    #[strum(serialize = "LD A,(HL-)")]
    LdAFromHlDec = 0x3A,
    #[strum(serialize = "LD (nn),A")]
    LdMemFromA = 0xEA,
    #[strum(serialize = "LD A,(nn)")]
    LdAFromMem = 0xFA,
}

/// Length of the address-bearing encodings
pub const ADDRESS_ENCODING_LEN: usize = 3;

impl Encoding {
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::from_repr(opcode)
    }

    pub fn opcode(&self) -> u8 {
        *self as u8
    }

    pub fn mnemonic(&self) -> &'static str {
        self.into()
    }

    /// Total encoding length in bytes
    pub fn length(&self) -> usize {
        match self {
            Self::LdHlIncFromA | Self::LdAFromHlInc | Self::LdHlDecFromA | Self::LdAFromHlDec => 1,
            _ => ADDRESS_ENCODING_LEN,
        }
    }

    pub fn is_address_bearing(&self) -> bool {
        self.length() == ADDRESS_ENCODING_LEN
    }

    /// Decode the operand of an address-bearing encoding starting at `offset`.
    ///
    /// Returns `None` when `offset` does not hold an address-bearing opcode or
    /// the operand runs past the end of `bytes`.
    pub fn decode_at(bytes: &[u8], offset: usize) -> Option<(Self, u16)> {
        let encoding = Self::from_opcode(*bytes.get(offset)?)?;
        if !encoding.is_address_bearing() {
            return None;
        }
        let operand = crate::rom::read_u16_le(bytes, offset.checked_add(1)?)?;
        Some((encoding, operand))
    }
}
