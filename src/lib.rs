//! CHIP-8 interpreter core.
//!
//! [`emu::Chip8`] owns memory, registers, call stack, keypad and display and
//! executes one instruction per [`emu::Chip8::cpu_cycle`]. [`emu::Chip8Runner`]
//! paces it against wall-clock time for front-ends.

pub mod emu;
mod nibble;

pub use nibble::u4;
