use super::*;

#[cfg(test)]
mod additional_ppu_tests {
    use super::*;
    use crate::ppu::background::{attribute_palette, background_palette_index};
    use crate::ppu::renderer::{system_color, FRAME_HEIGHT, FRAME_WIDTH};
    use crate::ppu::sprites::sprite_palette_index;

    const BLACK: [u8; 4] = [0, 0, 0, 0xFF];

    fn rgba(index: u8) -> [u8; 4] {
        let (r, g, b) = system_color(index);
        [r, g, b, 0xFF]
    }

    /// Writes a tile whose every pixel has `color`.
    fn solid_tile(ppu: &mut Ppu, base: u16, index: u8, color: u8) {
        let start = base + index as u16 * 16;
        let low = if color & 1 != 0 { 0xFF } else { 0x00 };
        let high = if color & 2 != 0 { 0xFF } else { 0x00 };
        for row in 0..8 {
            ppu.write_vram(start + row, low);
            ppu.write_vram(start + row + 8, high);
        }
    }

    fn pixel(ppu: &Ppu, x: usize, y: usize) -> [u8; 4] {
        ppu.frame_buffer().pixel(x, y)
    }

    #[test]
    fn test_background_tile_end_to_end() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x0000, 5, 3);
        ppu.write_vram(0x2000, 5);
        ppu.write_vram(0x23C0, 0x02); // top-left 2x2 uses palette 2
        ppu.write_vram(0x3F0B, 0x16); // palette 2, color 3

        let tile = ppu.locate_background_tile(0, 0, 0, 0, 0);
        assert_eq!(tile.pattern_index, 5);
        assert_eq!(tile.palette, 2);
        assert_eq!(background_palette_index(tile.palette, 3), 11);

        ppu.render_background_tile(0, 0, 0, 0, 0);

        assert_eq!(pixel(&ppu, 0, 0), rgba(0x16));
        assert_eq!(pixel(&ppu, 7, 7), rgba(0x16));
        assert_eq!(pixel(&ppu, 8, 0), BLACK);
    }

    #[test]
    fn test_background_uses_high_pattern_table() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x1000, 1, 1);
        ppu.write_vram(0x2000, 1);
        ppu.write_vram(0x3F01, 0x2A);
        ppu.write_register(PPUCTRL, 0x10);

        ppu.render_background_tile(0, 0, 0, 0, 0);

        assert_eq!(pixel(&ppu, 3, 3), rgba(0x2A));
    }

    #[test]
    fn test_backdrop_rule() {
        for palette in 0..4 {
            assert_eq!(background_palette_index(palette, 0), 0x10);
        }
        assert_eq!(background_palette_index(1, 2), 6);
        assert_eq!(background_palette_index(3, 1), 13);

        let mut ppu = Ppu::new(Mirroring::Horizontal);
        // Tile 0 is blank, so every pixel is color 0
        ppu.write_vram(0x23C0, 0xFF);
        ppu.write_vram(0x3F00, 0x21);
        ppu.write_vram(0x3F0C, 0x05);

        ppu.render_background_tile(0, 0, 0, 0, 0);

        assert_eq!(pixel(&ppu, 0, 0), rgba(0x21));
    }

    #[test]
    fn test_attribute_quadrants() {
        let attribute = 0b11_10_01_00;
        assert_eq!(attribute_palette(attribute, 0, 0), 0);
        assert_eq!(attribute_palette(attribute, 1, 1), 0);
        assert_eq!(attribute_palette(attribute, 2, 0), 1);
        assert_eq!(attribute_palette(attribute, 6, 1), 1);
        assert_eq!(attribute_palette(attribute, 0, 2), 2);
        assert_eq!(attribute_palette(attribute, 2, 2), 3);
        assert_eq!(attribute_palette(attribute, 3, 3), 3);
    }

    #[test]
    fn test_attribute_byte_per_4x4_block() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        // Block (1,1) of attribute bytes covers tiles x 4..7, y 4..7
        ppu.write_vram(0x23C0 + 1 + 8, 0b01_00_00_00);

        let tile = ppu.locate_background_tile(6, 6, 0, 0, 0);
        assert_eq!(tile.palette, 1);
        let tile = ppu.locate_background_tile(4, 4, 0, 0, 0);
        assert_eq!(tile.palette, 0);
    }

    #[test]
    fn test_fine_scroll_shifts_pixels() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        // Tile 1: only the leftmost column is color 1
        for row in 0..8 {
            ppu.write_vram(16 + row, 0x80);
        }
        ppu.write_vram(0x2001, 1);
        ppu.write_vram(0x3F00, 0x0F);
        ppu.write_vram(0x3F01, 0x30);

        ppu.render_background_tile(0, 0, 3, 0, 0);
        ppu.render_background_tile(1, 0, 3, 0, 0);

        assert_eq!(pixel(&ppu, 4, 0), rgba(0x0F));
        assert_eq!(pixel(&ppu, 5, 0), rgba(0x30));
        assert_eq!(pixel(&ppu, 6, 0), rgba(0x0F));
    }

    #[test]
    fn test_partial_tile_is_clipped() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x0000, 0, 1);
        ppu.write_vram(0x3F01, 0x30);

        // Tile 32 with fine scroll 4 starts at x = 252
        ppu.render_background_tile(32, 0, 4, 0, 0);

        assert_eq!(pixel(&ppu, 251, 0), BLACK);
        assert_eq!(pixel(&ppu, 252, 0), rgba(0x30));
        assert_eq!(pixel(&ppu, 255, 0), rgba(0x30));
    }

    #[test]
    fn test_main_screen_selects_quadrant() {
        let mut horizontal = Ppu::new(Mirroring::Horizontal);
        horizontal.write_vram(0x2000, 0x11);
        horizontal.write_vram(0x2800, 0x22);

        let tile = horizontal.locate_background_tile(0, 0, 0, 0, 1);
        assert_eq!(tile.quadrant, 1);
        assert_eq!(tile.pattern_index, 0x11);

        let tile = horizontal.locate_background_tile(0, 0, 0, 0, 2);
        assert_eq!(tile.quadrant, 2);
        assert_eq!(tile.pattern_index, 0x22);

        let mut vertical = Ppu::new(Mirroring::Vertical);
        vertical.write_vram(0x2400, 0x33);

        let tile = vertical.locate_background_tile(0, 0, 0, 0, 1);
        assert_eq!(tile.quadrant, 1);
        assert_eq!(tile.pattern_index, 0x33);
        let tile = vertical.locate_background_tile(0, 0, 0, 0, 3);
        assert_eq!(tile.quadrant, 3);
        assert_eq!(tile.pattern_index, 0x33);
    }

    #[test]
    fn test_scroll_crosses_into_next_quadrant() {
        let ppu = Ppu::new(Mirroring::FourScreen);

        // 250 + 8 lands 2 pixels into the right-hand quadrant
        let tile = ppu.locate_background_tile(1, 0, 250, 0, 0);
        assert_eq!(tile.quadrant, 1);
        assert_eq!(tile.block_x, 0);

        // 239 + 8 lands 7 lines into the bottom quadrant
        let tile = ppu.locate_background_tile(0, 1, 0, 239, 0);
        assert_eq!(tile.quadrant, 2);
        assert_eq!(tile.block_y, 0);
    }

    #[test]
    fn test_plane_wraps_at_edges() {
        let ppu = Ppu::new(Mirroring::FourScreen);

        // Origin at bottom-right: 256 + 255 + 8 = 519 wraps to 7
        let tile = ppu.locate_background_tile(1, 0, 255, 0, 3);
        assert_eq!(tile.quadrant, 2);
        assert_eq!(tile.block_x, 0);

        // 240 + 232 + 16 = 488 wraps to 8
        let tile = ppu.locate_background_tile(0, 2, 0, 232, 2);
        assert_eq!(tile.quadrant, 0);
        assert_eq!(tile.block_y, 1);
    }

    /// Tile 2: (row 0, col 0) is color 1 and (row 0, col 1) is color 2.
    fn asymmetric_sprite(ppu: &mut Ppu) {
        ppu.write_vram(0x0020, 0x80);
        ppu.write_vram(0x0028, 0x40);
        ppu.write_vram(0x3F11, 0x16);
        ppu.write_vram(0x3F12, 0x2A);
    }

    #[test]
    fn test_sprite_without_flip() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        asymmetric_sprite(&mut ppu);

        ppu.render_sprite(10, 20, 2, 0x00);

        assert_eq!(pixel(&ppu, 10, 20), rgba(0x16));
        assert_eq!(pixel(&ppu, 11, 20), rgba(0x2A));
        // Color 0 is transparent
        assert_eq!(pixel(&ppu, 12, 20), BLACK);
        assert_eq!(pixel(&ppu, 10, 21), BLACK);
    }

    #[test]
    fn test_sprite_flips() {
        let cases = [
            (0x40u8, (17, 20), (16, 20)),
            (0x80, (10, 27), (11, 27)),
            (0xC0, (17, 27), (16, 27)),
        ];
        for (attributes, first, second) in cases {
            let mut ppu = Ppu::new(Mirroring::Horizontal);
            asymmetric_sprite(&mut ppu);

            ppu.render_sprite(10, 20, 2, attributes);

            assert_eq!(pixel(&ppu, first.0, first.1), rgba(0x16), "attr {:02X}", attributes);
            assert_eq!(pixel(&ppu, second.0, second.1), rgba(0x2A), "attr {:02X}", attributes);
            assert_eq!(pixel(&ppu, 10, 20), BLACK);
        }
    }

    #[test]
    fn test_sprite_flip_is_reflection() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        // Random-ish tile 3
        let bytes = [
            0x81, 0x42, 0x24, 0x18, 0xF0, 0x0F, 0xAA, 0x55, 0x11, 0x22, 0x44, 0x88, 0xCC, 0x33,
            0x0F, 0xF0,
        ];
        for (i, &b) in bytes.iter().enumerate() {
            ppu.write_vram(0x0030 + i as u16, b);
        }
        for (i, color) in [0x00u8, 0x16, 0x2A, 0x30].iter().enumerate().skip(1) {
            ppu.write_vram(0x3F10 + i as u16, *color);
        }

        let mut plain = Ppu::new(Mirroring::Horizontal);
        plain.vram = ppu.vram.clone();
        plain.render_sprite(0, 0, 3, 0x00);

        for (attributes, fx, fy) in [(0x40u8, true, false), (0x80, false, true), (0xC0, true, true)] {
            let mut flipped = Ppu::new(Mirroring::Horizontal);
            flipped.vram = ppu.vram.clone();
            flipped.render_sprite(0, 0, 3, attributes);
            for y in 0..8 {
                for x in 0..8 {
                    let sx = if fx { 7 - x } else { x };
                    let sy = if fy { 7 - y } else { y };
                    assert_eq!(pixel(&flipped, x, y), pixel(&plain, sx, sy));
                }
            }
        }
    }

    #[test]
    fn test_sprite_palette_selection() {
        assert_eq!(sprite_palette_index(0, 0), None);
        assert_eq!(sprite_palette_index(2, 0), None);
        assert_eq!(sprite_palette_index(1, 1), Some(5));
        assert_eq!(sprite_palette_index(3, 3), Some(15));

        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x0000, 4, 1);
        ppu.write_vram(0x3F15, 0x27);
        ppu.write_vram(0x3F05, 0x01);

        ppu.render_sprite(0, 0, 4, 0x01);

        assert_eq!(pixel(&ppu, 0, 0), rgba(0x27));
    }

    #[test]
    fn test_sprite_clipped_at_frame_edge() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x0000, 1, 1);
        ppu.write_vram(0x3F11, 0x16);

        ppu.render_sprite(252, 252, 1, 0x00);

        assert_eq!(pixel(&ppu, 255, 255), rgba(0x16));
        assert_eq!(pixel(&ppu, 251, 252), BLACK);
    }

    #[test]
    fn test_frame_buffer_starts_opaque_black() {
        let ppu = Ppu::new(Mirroring::Horizontal);
        let frame = ppu.frame_buffer();
        assert_eq!(frame.width(), FRAME_WIDTH);
        assert_eq!(frame.height(), FRAME_HEIGHT);
        assert_eq!(frame.as_bytes().len(), FRAME_WIDTH * FRAME_HEIGHT * 4);
        assert!(frame.as_bytes().chunks_exact(4).all(|p| p == BLACK));
    }

    #[test]
    fn test_frame_buffer_clips_out_of_range() {
        let mut frame = FrameBuffer::new();
        frame.set_pixel(-1, 0, (1, 2, 3));
        frame.set_pixel(0, -1, (1, 2, 3));
        frame.set_pixel(256, 0, (1, 2, 3));
        frame.set_pixel(0, 256, (1, 2, 3));
        assert!(frame.as_bytes().chunks_exact(4).all(|p| p == BLACK));

        frame.set_pixel(255, 255, (1, 2, 3));
        assert_eq!(frame.pixel(255, 255), [1, 2, 3, 0xFF]);
    }

    #[test]
    fn test_render_frame_backdrop_when_disabled() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        ppu.write_vram(0x3F00, 0x12);

        ppu.render_frame();

        assert_eq!(pixel(&ppu, 0, 0), rgba(0x12));
        assert_eq!(pixel(&ppu, 255, 255), rgba(0x12));
    }

    #[test]
    fn test_render_frame_background_and_sprites() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x0000, 1, 1);
        ppu.write_vram(0x3F00, 0x0F);
        ppu.write_vram(0x3F01, 0x30);
        ppu.write_vram(0x3F11, 0x16);
        ppu.write_vram(0x2000 + 29 * 32 + 31, 1);
        ppu.write_register(PPUMASK, 0x18);

        let mut oam = [0xFFu8; OAM_SIZE];
        oam[..4].copy_from_slice(&[0x10, 0x01, 0x00, 0x20]);
        oam[4..8].copy_from_slice(&[0xEF, 0x01, 0x00, 0x40]);
        ppu.oam_dma(&oam);

        ppu.render_frame();

        assert_eq!(pixel(&ppu, 0, 0), rgba(0x0F));
        assert_eq!(pixel(&ppu, 248, 232), rgba(0x30));
        // Sprite appears one line below its OAM Y
        assert_eq!(pixel(&ppu, 0x20, 0x10), rgba(0x0F));
        assert_eq!(pixel(&ppu, 0x20, 0x11), rgba(0x16));
        assert_eq!(pixel(&ppu, 0x27, 0x18), rgba(0x16));
        // Y >= $EF hides the sprite
        assert_eq!(pixel(&ppu, 0x40, 0xF0), rgba(0x0F));
    }

    #[test]
    fn test_lower_oam_index_draws_on_top() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x0000, 1, 1);
        ppu.write_vram(0x3F11, 0x16);
        ppu.write_vram(0x3F15, 0x2A);
        ppu.write_register(PPUMASK, 0x10);

        let mut oam = [0xFFu8; OAM_SIZE];
        oam[..4].copy_from_slice(&[0x00, 0x01, 0x00, 0x00]);
        oam[4..8].copy_from_slice(&[0x00, 0x01, 0x01, 0x00]);
        ppu.oam_dma(&oam);

        ppu.render_frame();

        assert_eq!(pixel(&ppu, 0, 1), rgba(0x16));
    }

    fn scrolled_scene(sprite_y: u8) -> Ppu {
        let mut ppu = Ppu::new(Mirroring::Horizontal);
        solid_tile(&mut ppu, 0x0000, 1, 1);
        ppu.write_vram(0x3F00, 0x0F);
        ppu.write_vram(0x3F11, 0x16);
        ppu.write_register(PPUMASK, 0x18);
        ppu.write_register(PPUSCROLL, 0x00);
        ppu.write_register(PPUSCROLL, 0x07);

        let mut oam = [0xFFu8; OAM_SIZE];
        oam[..4].copy_from_slice(&[sprite_y, 0x01, 0x00, 0x00]);
        ppu.oam_dma(&oam);
        ppu
    }

    #[test]
    fn test_render_frame_does_not_keep_previous_frame() {
        let mut ppu = scrolled_scene(0xEC);
        ppu.render_frame();
        assert_eq!(pixel(&ppu, 0, 243), rgba(0x16));

        let mut oam = [0xFFu8; OAM_SIZE];
        oam[..4].copy_from_slice(&[0xFF, 0x01, 0x00, 0x00]);
        ppu.oam_dma(&oam);
        ppu.render_frame();

        let mut fresh = scrolled_scene(0xFF);
        fresh.render_frame();

        // Rows below the scrolled background fall back to the backdrop
        assert_eq!(pixel(&ppu, 0, 243), rgba(0x0F));
        assert_eq!(pixel(&ppu, 255, 255), rgba(0x0F));
        assert_eq!(ppu.frame_buffer().as_bytes(), fresh.frame_buffer().as_bytes());
    }
}
