use super::{Chip8Error, FONT, FONT_END_ADDRESS, FONT_START_ADDRESS};

// The constants are specified by the CHIP-8 specification
pub const MEMORY_SIZE: usize = 4096;
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - ROM_START_ADDRESS;

/// 4KB flat, byte addressable memory.
///
/// Addresses are never wrapped: anything at or past `MEMORY_SIZE` is an
/// `OutOfBoundsAccess` tagged with the program counter of the instruction
/// that attempted it.
#[derive(Clone)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Zeroed memory with the built-in font installed.
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);
        Self { bytes }
    }

    /// Copies `rom` verbatim to the program area.
    ///
    /// Memory is left untouched when the ROM does not fit.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }

        self.bytes[ROM_START_ADDRESS..ROM_START_ADDRESS + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    pub fn read(&self, address: usize, pc: u16) -> Result<u8, Chip8Error> {
        self.bytes
            .get(address)
            .copied()
            .ok_or(Chip8Error::OutOfBoundsAccess { address, pc })
    }

    pub fn write(&mut self, address: usize, value: u8, pc: u16) -> Result<(), Chip8Error> {
        let byte = self
            .bytes
            .get_mut(address)
            .ok_or(Chip8Error::OutOfBoundsAccess { address, pc })?;
        *byte = value;
        Ok(())
    }

    /// Borrows `len` bytes starting at `address`, all or nothing.
    pub fn slice(&self, address: usize, len: usize, pc: u16) -> Result<&[u8], Chip8Error> {
        let end = Self::checked_end(address, len, pc)?;
        Ok(&self.bytes[address..end])
    }

    /// Mutable counterpart of [`Memory::slice`].
    pub fn slice_mut(
        &mut self,
        address: usize,
        len: usize,
        pc: u16,
    ) -> Result<&mut [u8], Chip8Error> {
        let end = Self::checked_end(address, len, pc)?;
        Ok(&mut self.bytes[address..end])
    }

    /// Reads the big-endian instruction word at `pc`.
    pub fn fetch_word(&self, pc: u16) -> Result<u16, Chip8Error> {
        let word = self.slice(pc as usize, 2, pc)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn checked_end(address: usize, len: usize, pc: u16) -> Result<usize, Chip8Error> {
        match address.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(end),
            // Report the first byte that falls outside memory.
            _ => Err(Chip8Error::OutOfBoundsAccess {
                address: address.max(MEMORY_SIZE),
                pc,
            }),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
