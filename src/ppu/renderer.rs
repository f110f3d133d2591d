use super::background::{TILES_HIGH, TILES_WIDE};
use super::memory::BACKDROP_INDEX;
use super::registers::PpuMask;
use super::{Ppu, OAM_SIZE};

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 256;
const BYTES_PER_PIXEL: usize = 4;

/// Sprites at or below this Y are hidden.
const SPRITE_HIDDEN_Y: u8 = 0xEF;

pub type Rgb = (u8, u8, u8);

/// 256x256 RGBA surface written only by the compositors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        let mut frame = Self {
            pixels: vec![0; FRAME_WIDTH * FRAME_HEIGHT * BYTES_PER_PIXEL],
        };
        frame.fill((0, 0, 0));
        frame
    }

    pub fn width(&self) -> usize {
        FRAME_WIDTH
    }

    pub fn height(&self) -> usize {
        FRAME_HEIGHT
    }

    /// RGBA at (x, y). Panics outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * FRAME_WIDTH + x) * BYTES_PER_PIXEL;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Writes an opaque pixel; coordinates off the surface are dropped.
    pub(crate) fn set_pixel(&mut self, x: i32, y: i32, (r, g, b): Rgb) {
        if x < 0 || y < 0 || x as usize >= FRAME_WIDTH || y as usize >= FRAME_HEIGHT {
            return;
        }
        let i = (y as usize * FRAME_WIDTH + x as usize) * BYTES_PER_PIXEL;
        self.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(&[r, g, b, 0xFF]);
    }

    pub(crate) fn fill(&mut self, (r, g, b): Rgb) {
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&[r, g, b, 0xFF]);
        }
    }
}

impl Ppu {
    /// Composes a whole frame from the current state: a backdrop fill,
    /// the background when PPUMASK enables it, then every visible sprite in
    /// sprite RAM. Nothing from the previous frame survives.
    pub fn render_frame(&mut self) {
        let mask = self.mask();

        let backdrop = self.palette_rgb(BACKDROP_INDEX);
        self.frame.fill(backdrop);

        if mask.contains(PpuMask::BG_ENABLE) {
            let (scroll_x, scroll_y) = self.scroll();
            let main_screen = self.control().main_screen();
            // One extra row and column so fine scroll never leaves a gap.
            for tile_y in 0..=TILES_HIGH {
                for tile_x in 0..=TILES_WIDE {
                    self.render_background_tile(
                        tile_x,
                        tile_y,
                        scroll_x as u16,
                        scroll_y as u16,
                        main_screen,
                    );
                }
            }
        }

        if mask.contains(PpuMask::SPRITE_ENABLE) {
            // Lower OAM indices have priority, so they are drawn last.
            for sprite in (0..OAM_SIZE / 4).rev() {
                let entry = sprite * 4;
                let y = self.oam[entry];
                if y >= SPRITE_HIDDEN_Y {
                    continue;
                }
                let (pattern_index, attributes, x) =
                    (self.oam[entry + 1], self.oam[entry + 2], self.oam[entry + 3]);
                // OAM Y is one line above where the sprite appears.
                self.render_sprite(x, y + 1, pattern_index, attributes);
            }
        }
    }
}

/// 2C02 system palette as RGB.
const SYSTEM_PALETTE: [Rgb; 64] = [
    (0x80, 0x80, 0x80), (0x00, 0x3D, 0xA6), (0x00, 0x12, 0xB0), (0x44, 0x00, 0x96),
    (0xA1, 0x00, 0x5E), (0xC7, 0x00, 0x28), (0xBA, 0x06, 0x00), (0x8C, 0x17, 0x00),
    (0x5C, 0x2F, 0x00), (0x10, 0x45, 0x00), (0x05, 0x4A, 0x00), (0x00, 0x47, 0x2E),
    (0x00, 0x41, 0x66), (0x00, 0x00, 0x00), (0x05, 0x05, 0x05), (0x05, 0x05, 0x05),
    (0xC7, 0xC7, 0xC7), (0x00, 0x77, 0xFF), (0x21, 0x55, 0xFF), (0x82, 0x37, 0xFA),
    (0xEB, 0x2F, 0xB5), (0xFF, 0x29, 0x50), (0xFF, 0x22, 0x00), (0xD6, 0x32, 0x00),
    (0xC4, 0x62, 0x00), (0x35, 0x80, 0x00), (0x05, 0x8F, 0x00), (0x00, 0x8A, 0x55),
    (0x00, 0x99, 0xCC), (0x21, 0x21, 0x21), (0x09, 0x09, 0x09), (0x09, 0x09, 0x09),
    (0xFF, 0xFF, 0xFF), (0x0F, 0xD7, 0xFF), (0x69, 0xA2, 0xFF), (0xD4, 0x80, 0xFF),
    (0xFF, 0x45, 0xF3), (0xFF, 0x61, 0x8B), (0xFF, 0x88, 0x33), (0xFF, 0x9C, 0x12),
    (0xFA, 0xBC, 0x20), (0x9F, 0xE3, 0x0E), (0x2B, 0xF0, 0x35), (0x0C, 0xF0, 0xA4),
    (0x05, 0xFB, 0xFF), (0x5E, 0x5E, 0x5E), (0x0D, 0x0D, 0x0D), (0x0D, 0x0D, 0x0D),
    (0xFF, 0xFF, 0xFF), (0xA6, 0xFC, 0xFF), (0xB3, 0xEC, 0xFF), (0xDA, 0xAB, 0xEB),
    (0xFF, 0xA8, 0xF9), (0xFF, 0xAB, 0xB3), (0xFF, 0xD2, 0xB0), (0xFF, 0xEF, 0xA6),
    (0xFF, 0xF7, 0x9C), (0xD7, 0xFF, 0xB3), (0xC6, 0xFF, 0xC2), (0xC6, 0xFF, 0xD7),
    (0xC4, 0xFF, 0xFF), (0xB9, 0xB9, 0xB9), (0xA4, 0xA4, 0xA4), (0xA4, 0xA4, 0xA4),
];

/// Palette RAM values are 6-bit indices into the system palette.
pub fn system_color(index: u8) -> Rgb {
    SYSTEM_PALETTE[(index & 0x3F) as usize]
}
