use bitflags::bitflags;

use super::memory::SPRITE_PALETTE_OFFSET;
use super::Ppu;

bitflags! {
    /// Byte 2 of a sprite RAM entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpriteAttributes: u8 {
        const PALETTE = 0b00000011;
        const BEHIND_BACKGROUND = 0b00100000;
        const FLIP_HORIZONTAL = 0b01000000;
        const FLIP_VERTICAL = 0b10000000;
    }
}

impl SpriteAttributes {
    pub fn palette(self) -> u8 {
        (self & SpriteAttributes::PALETTE).bits()
    }
}

impl Ppu {
    /// Draws one 8x8 sprite with its top-left corner at (`x`, `y`).
    ///
    /// Flips mirror the tile independently on each axis. Color 0 of every
    /// sprite palette is transparent and leaves the frame untouched.
    pub fn render_sprite(&mut self, x: u8, y: u8, pattern_index: u8, attributes: u8) {
        let attributes = SpriteAttributes::from_bits_retain(attributes);
        let flip_h = attributes.contains(SpriteAttributes::FLIP_HORIZONTAL);
        let flip_v = attributes.contains(SpriteAttributes::FLIP_VERTICAL);

        let base = self.registers.control.sprite_pattern_base();
        let pattern = self.vram.pattern(base, pattern_index);

        for row in 0..8 {
            let source_row = if flip_v { 7 - row } else { row };
            for column in 0..8 {
                let source_column = if flip_h { 7 - column } else { column };
                let color = pattern.color(source_row, source_column);
                let Some(index) = sprite_palette_index(attributes.palette(), color) else {
                    continue;
                };
                let rgb = self.palette_rgb(SPRITE_PALETTE_OFFSET + index);
                self.frame
                    .set_pixel(x as i32 + column as i32, y as i32 + row as i32, rgb);
            }
        }
    }
}

/// Index into the sprite palette bank, or `None` for a transparent pixel.
pub fn sprite_palette_index(palette: u8, color: u8) -> Option<u16> {
    let index = ((palette & 0x03) * 4 + (color & 0x03)) as u16;
    if index % 4 == 0 {
        None
    } else {
        Some(index)
    }
}
