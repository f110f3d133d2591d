//! Picture processing unit: register ports, VRAM, sprite RAM and the
//! background/sprite compositors that fill the frame buffer.

pub mod background;
pub mod memory;
pub mod registers;
pub mod renderer;
pub mod sprites;


#[cfg(test)]
mod additional_tests;

use crate::debug_flags;

use memory::{Mirroring, Vram, PALETTE_BASE};
use registers::{PpuControl, PpuMask, PpuRegisters, PpuStatus};
use renderer::{system_color, FrameBuffer, Rgb};

pub const OAM_SIZE: usize = 256;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;

pub const PPUCTRL: u16 = 0x2000;
pub const PPUMASK: u16 = 0x2001;
pub const PPUSTATUS: u16 = 0x2002;
pub const OAMADDR: u16 = 0x2003;
pub const OAMDATA: u16 = 0x2004;
pub const PPUSCROLL: u16 = 0x2005;
pub const PPUADDR: u16 = 0x2006;
pub const PPUDATA: u16 = 0x2007;

pub struct Ppu {
    pub(crate) registers: PpuRegisters,
    pub(crate) vram: Vram,
    pub(crate) oam: [u8; OAM_SIZE],
    frame: FrameBuffer,
}

impl Ppu {
    pub fn new(mirroring: Mirroring) -> Self {
        Ppu {
            registers: PpuRegisters::new(),
            vram: Vram::new(mirroring),
            oam: [0xFF; OAM_SIZE], // 0xFF parks every sprite off-screen
            frame: FrameBuffer::new(),
        }
    }

    /// Port read. `addr` may be any mirror of $2000-$2007.
    pub fn read_register(&mut self, addr: u16) -> u8 {
        match addr & 0x2007 {
            PPUSTATUS => self.registers.read_status(),
            OAMDATA => self.oam[self.registers.oam_addr as usize],
            PPUDATA => self.read_data(),
            // Write-only ports read back the last buffered value
            _ => self.registers.data_buffer,
        }
    }

    /// Port write. `addr` may be any mirror of $2000-$2007.
    pub fn write_register(&mut self, addr: u16, data: u8) {
        let port = addr & 0x2007;
        if debug_flags::ppu_write() {
            log::debug!("PPU write ${:04X} <- ${:02X}", port, data);
        }
        match port {
            PPUCTRL => self.registers.control = PpuControl::from_bits_truncate(data),
            PPUMASK => self.registers.mask = PpuMask::from_bits_truncate(data),
            OAMADDR => self.registers.oam_addr = data,
            OAMDATA => {
                self.oam[self.registers.oam_addr as usize] = data;
                self.registers.oam_addr = self.registers.oam_addr.wrapping_add(1);
            }
            PPUSCROLL => self.registers.write_scroll(data),
            PPUADDR => self.registers.write_addr(data),
            PPUDATA => {
                self.vram.write(self.registers.addr, data);
                self.registers.increment_vram_addr();
            }
            _ => {} // PPUSTATUS is read-only
        }
    }

    fn read_data(&mut self) -> u8 {
        let addr = self.registers.addr;
        let value = if addr >= PALETTE_BASE {
            // Palette reads skip the delay; the buffer takes the nametable byte underneath.
            self.registers.data_buffer = self.vram.read(addr - 0x1000);
            self.vram.read(addr)
        } else {
            let buffered = self.registers.data_buffer;
            self.registers.data_buffer = self.vram.read(addr);
            buffered
        };
        self.registers.increment_vram_addr();
        value
    }

    /// Copies a 256-byte CPU page into sprite RAM starting at OAMADDR.
    pub fn oam_dma(&mut self, page: &[u8]) {
        for &byte in page.iter().take(OAM_SIZE) {
            self.oam[self.registers.oam_addr as usize] = byte;
            self.registers.oam_addr = self.registers.oam_addr.wrapping_add(1);
        }
    }

    /// Advances the raster counter by one scanline. Returns true when the PPU
    /// enters vblank with NMI enabled.
    pub fn step_scanline(&mut self) -> bool {
        self.registers.raster = (self.registers.raster + 1) % SCANLINES_PER_FRAME;
        match self.registers.raster {
            VBLANK_SCANLINE => {
                self.registers.status.insert(PpuStatus::VBLANK);
                self.registers.control.contains(PpuControl::NMI_ENABLE)
            }
            PRE_RENDER_SCANLINE => {
                self.registers.status.remove(PpuStatus::VBLANK | PpuStatus::SPRITE_0_HIT);
                false
            }
            _ => false,
        }
    }

    pub fn raster(&self) -> u16 {
        self.registers.raster
    }

    pub fn control(&self) -> PpuControl {
        self.registers.control
    }

    pub fn mask(&self) -> PpuMask {
        self.registers.mask
    }

    pub fn scroll(&self) -> (u8, u8) {
        (self.registers.scroll[0], self.registers.scroll[1])
    }

    pub fn mirroring(&self) -> Mirroring {
        self.vram.mirroring()
    }

    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.vram.set_mirroring(mirroring);
    }

    /// Cartridge boundary: populate pattern tables before rendering.
    pub fn load_pattern_tables(&mut self, chr: &[u8]) {
        self.vram.load_pattern_tables(chr);
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram.read(addr)
    }

    pub fn write_vram(&mut self, addr: u16, data: u8) {
        self.vram.write(addr, data);
    }

    pub fn oam(&self) -> &[u8; OAM_SIZE] {
        &self.oam
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }

    /// RGB color for a palette RAM index relative to $3F00.
    fn palette_rgb(&self, index: u16) -> Rgb {
        system_color(self.vram.palette_entry(index))
    }
}
