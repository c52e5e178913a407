use crate::u4;

pub const KEY_COUNT: usize = 16;

/// Hex keypad state: 16 keys mapped as booleans (true = pressed).
///
/// The front-end owns the mapping from physical keys and writes the state
/// here before the cycles that read it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keys[key] = pressed;
    }

    /// Checks the key named by the low nibble of `value`.
    pub fn is_pressed(&self, value: u8) -> bool {
        self.keys[u4::from_low_bits(value)]
    }

    /// Lowest numbered key currently held down.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&down| down).map(|key| key as u8)
    }

    /// Releases every key.
    pub fn clear(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }
}
