use std::fmt;

use super::{DISPLAY_X, DISPLAY_Y, Display};

/// Sprites are always one byte, eight pixels, wide.
const SPRITE_WIDTH: usize = 8;

/// 64x32 monochrome frame buffer.
///
/// Only [`DisplayBuffer::clear`] and [`DisplayBuffer::draw_sprite`] change it;
/// both mark the frame dirty so the front-end knows to present it.
#[derive(Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    pixels: Display<bool>,
    dirty: bool,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self {
            pixels: [[false; DISPLAY_X]; DISPLAY_Y],
            dirty: false,
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_X]; DISPLAY_Y];
        self.dirty = true;
    }

    /// XORs `sprite` onto the buffer, one byte per row, most significant bit
    /// on the left. Returns true if any lit pixel was turned off.
    ///
    /// The origin wraps around the screen, the sprite itself does not: columns
    /// past the right edge and rows past the bottom edge are clipped.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x_pos = x as usize % DISPLAY_X;
        let y_pos = y as usize % DISPLAY_Y;

        // Don't draw out of bounds
        let row_count = std::cmp::min(sprite.len(), DISPLAY_Y - y_pos);
        let col_count = std::cmp::min(SPRITE_WIDTH, DISPLAY_X - x_pos);

        let mut any_erased = false;
        for (row, &sprite_byte) in sprite.iter().take(row_count).enumerate() {
            for col in 0..col_count {
                // If current sprite bit is non-zero
                if (sprite_byte & (0x80 >> col)) != 0 {
                    let pixel = &mut self.pixels[y_pos + row][x_pos + col];

                    // Flip the pixel
                    *pixel ^= true;

                    if !*pixel {
                        any_erased = true;
                    }
                }
            }
        }

        self.dirty = true;
        any_erased
    }

    /// Number of sprite rows that land on screen when drawing at row `y`.
    pub fn visible_rows(y: u8, rows: usize) -> usize {
        std::cmp::min(rows, DISPLAY_Y - y as usize % DISPLAY_Y)
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[y][x]
    }

    /// Read-only snapshot, row major.
    pub fn rows(&self) -> &Display<bool> {
        &self.pixels
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|&&on| on).count()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Checks and clears the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.pixels {
            for &on in row {
                f.write_str(if on { "█" } else { " " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayBuffer")
            .field("lit", &self.lit_count())
            .field("dirty", &self.dirty)
            .finish()
    }
}
