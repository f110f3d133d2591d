//! Background tile compositor.
//!
//! The four nametable quadrants form a 512x480 logical plane. Scroll and the
//! main-screen index pick the origin; each on-screen tile is looked up in the
//! quadrant its absolute position falls in, wrapping at the plane edges.

use super::memory::{ATTRIBUTE_COLUMNS, BACKDROP_INDEX, NAMETABLE_COLUMNS};
use super::Ppu;

pub const SCREEN_WIDTH: u16 = 256;
pub const SCREEN_HEIGHT: u16 = 240;
pub const TILES_WIDE: u16 = SCREEN_WIDTH / 8;
pub const TILES_HIGH: u16 = SCREEN_HEIGHT / 8;

/// Nametable lookup result for one on-screen tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundTile {
    /// Logical quadrant 0-3 (0 top-left, 1 top-right, 2 bottom-left, 3 bottom-right).
    pub quadrant: u8,
    /// Tile column / row inside the quadrant's 32x30 grid.
    pub block_x: u16,
    pub block_y: u16,
    pub pattern_index: u8,
    pub palette: u8,
}

impl Ppu {
    /// Draws the 8x8 tile at screen tile position (`tile_x`, `tile_y`).
    ///
    /// Pixels land at the tile position shifted left/up by the scroll's
    /// sub-tile remainder; anything off the frame is clipped.
    pub fn render_background_tile(
        &mut self,
        tile_x: u16,
        tile_y: u16,
        scroll_x: u16,
        scroll_y: u16,
        main_screen: u8,
    ) {
        let tile = self.locate_background_tile(tile_x, tile_y, scroll_x, scroll_y, main_screen);
        let base = self.registers.control.background_pattern_base();
        let pattern = self.vram.pattern(base, tile.pattern_index);

        let origin_x = tile_x as i32 * 8 - (scroll_x % 8) as i32;
        let origin_y = tile_y as i32 * 8 - (scroll_y % 8) as i32;

        for row in 0..8 {
            for column in 0..8 {
                let color = pattern.color(row, column);
                let rgb = self.palette_rgb(background_palette_index(tile.palette, color));
                self.frame
                    .set_pixel(origin_x + column as i32, origin_y + row as i32, rgb);
            }
        }
    }

    pub fn locate_background_tile(
        &self,
        tile_x: u16,
        tile_y: u16,
        scroll_x: u16,
        scroll_y: u16,
        main_screen: u8,
    ) -> BackgroundTile {
        let (origin_x, origin_y) = match main_screen & 0x03 {
            0 => (0, 0),
            1 => (SCREEN_WIDTH, 0),
            2 => (0, SCREEN_HEIGHT),
            _ => (SCREEN_WIDTH, SCREEN_HEIGHT),
        };

        let plane_x = wrap_plane(origin_x, scroll_x, tile_x, SCREEN_WIDTH);
        let plane_y = wrap_plane(origin_y, scroll_y, tile_y, SCREEN_HEIGHT);

        let quadrant = ((plane_x >= SCREEN_WIDTH) as u8) | (((plane_y >= SCREEN_HEIGHT) as u8) << 1);
        let block_x = (plane_x % SCREEN_WIDTH) / 8;
        let block_y = (plane_y % SCREEN_HEIGHT) / 8;

        let location = self.vram.quadrant(quadrant);
        let pattern_index = self
            .vram
            .physical(location.nametable + block_x + block_y * NAMETABLE_COLUMNS);
        let attribute = self
            .vram
            .physical(location.attributes + block_x / 4 + (block_y / 4) * ATTRIBUTE_COLUMNS);

        BackgroundTile {
            quadrant,
            block_x,
            block_y,
            pattern_index,
            palette: attribute_palette(attribute, block_x, block_y),
        }
    }
}

fn wrap_plane(origin: u16, scroll: u16, tile: u16, screen: u16) -> u16 {
    let absolute = origin as u32 + scroll as u32 + tile as u32 * 8;
    (absolute % (screen as u32 * 2)) as u16
}

/// Picks the 2-bit palette selector for a tile out of its attribute byte.
/// Bits 0-1 cover the top-left 2x2 tiles, 2-3 top-right, 4-5 bottom-left,
/// 6-7 bottom-right.
pub fn attribute_palette(attribute: u8, block_x: u16, block_y: u16) -> u8 {
    let shift = match (block_x % 4 >= 2, block_y % 4 >= 2) {
        (false, false) => 0,
        (true, false) => 2,
        (false, true) => 4,
        (true, true) => 6,
    };
    (attribute >> shift) & 0x03
}

/// Palette RAM index (relative to $3F00) for a background pixel. Color 0 of
/// every background palette shows the shared backdrop.
pub fn background_palette_index(palette: u8, color: u8) -> u16 {
    let index = ((palette & 0x03) * 4 + (color & 0x03)) as u16;
    if index % 4 == 0 {
        BACKDROP_INDEX
    } else {
        index
    }
}
