use std::fmt;

use crate::u4;

/// A raw 16-bit instruction word, as fetched big-endian from memory.
///
/// Field extraction is total: every word yields every field, whether or not
/// the instruction it encodes uses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction(pub u16);

impl Instruction {
    pub const fn from_bytes(high: u8, low: u8) -> Self {
        Self(u16::from_be_bytes([high, low]))
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Opcode family, bits 12-15.
    pub const fn family(self) -> u4 {
        u4::from_low_bits((self.0 >> 12) as u8)
    }

    /// Register index X, bits 8-11.
    pub const fn x(self) -> u4 {
        u4::from_low_bits((self.0 >> 8) as u8)
    }

    /// Register index Y, bits 4-7.
    pub const fn y(self) -> u4 {
        u4::from_low_bits((self.0 >> 4) as u8)
    }

    /// 4-bit immediate, bits 0-3.
    pub const fn n(self) -> u4 {
        u4::from_low_bits(self.0 as u8)
    }

    /// 8-bit immediate, bits 0-7.
    pub const fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// 12-bit address, bits 0-11.
    pub const fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// All four nibbles, most significant first.
    pub const fn nibbles(self) -> (u8, u8, u8, u8) {
        (
            ((self.0 & 0xF000) >> 12) as u8,
            ((self.0 & 0x0F00) >> 8) as u8,
            ((self.0 & 0x00F0) >> 4) as u8,
            (self.0 & 0x000F) as u8,
        )
    }
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        Self(word)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}
