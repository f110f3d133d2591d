use bitflags::bitflags;

use super::memory::{PATTERN_TABLE_HIGH, PATTERN_TABLE_LOW, VRAM_ADDR_MASK};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuControl: u8 {
        const NAMETABLE_X = 0b00000001;
        const NAMETABLE_Y = 0b00000010;
        const VRAM_INCREMENT = 0b00000100;
        const SPRITE_PATTERN = 0b00001000;
        const BG_PATTERN = 0b00010000;
        const SPRITE_SIZE = 0b00100000;
        const PPU_MASTER_SLAVE = 0b01000000;
        const NMI_ENABLE = 0b10000000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuMask: u8 {
        const GRAYSCALE = 0b00000001;
        const BG_LEFT_ENABLE = 0b00000010;
        const SPRITE_LEFT_ENABLE = 0b00000100;
        const BG_ENABLE = 0b00001000;
        const SPRITE_ENABLE = 0b00010000;
        const EMPHASIZE_RED = 0b00100000;
        const EMPHASIZE_GREEN = 0b01000000;
        const EMPHASIZE_BLUE = 0b10000000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuStatus: u8 {
        const SPRITE_OVERFLOW = 0b00100000;
        const SPRITE_0_HIT = 0b01000000;
        const VBLANK = 0b10000000;
    }
}

impl PpuControl {
    /// Pattern table used for background tiles.
    pub fn background_pattern_base(self) -> u16 {
        if self.contains(PpuControl::BG_PATTERN) {
            PATTERN_TABLE_HIGH
        } else {
            PATTERN_TABLE_LOW
        }
    }

    /// Pattern table used for 8x8 sprites.
    pub fn sprite_pattern_base(self) -> u16 {
        if self.contains(PpuControl::SPRITE_PATTERN) {
            PATTERN_TABLE_HIGH
        } else {
            PATTERN_TABLE_LOW
        }
    }

    pub fn vram_increment(self) -> u16 {
        if self.contains(PpuControl::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Logical quadrant (0-3) the scroll origin starts in.
    pub fn main_screen(self) -> u8 {
        (self & (PpuControl::NAMETABLE_X | PpuControl::NAMETABLE_Y)).bits()
    }
}

/// Register file and port latches the CPU reaches through $2000-$2007.
#[derive(Debug, Clone)]
pub struct PpuRegisters {
    pub control: PpuControl,
    pub mask: PpuMask,
    pub status: PpuStatus,
    pub oam_addr: u8,

    /// VRAM pointer set through PPUADDR, 14 bits.
    pub addr: u16,
    /// PPUDATA reads return this and refill it.
    pub data_buffer: u8,
    /// (horizontal pixel offset, vertical pixel offset)
    pub scroll: [u8; 2],
    /// Write toggle shared by PPUSCROLL and PPUADDR; true means the next
    /// write is the second half.
    pub w: bool,

    pub raster: u16,
}

impl Default for PpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl PpuRegisters {
    pub fn new() -> Self {
        Self {
            control: PpuControl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            oam_addr: 0,
            addr: 0,
            data_buffer: 0,
            scroll: [0, 0],
            w: false,
            raster: 0,
        }
    }

    pub fn write_scroll(&mut self, data: u8) {
        let half = self.w as usize;
        self.scroll[half] = data;
        self.w = !self.w;
    }

    pub fn write_addr(&mut self, data: u8) {
        if self.w {
            self.addr = (self.addr & 0xFF00) | data as u16;
        } else {
            self.addr = (((data as u16) << 8) | (self.addr & 0x00FF)) & VRAM_ADDR_MASK;
        }
        self.w = !self.w;
    }

    pub fn increment_vram_addr(&mut self) {
        let increment = self.control.vram_increment();
        self.addr = self.addr.wrapping_add(increment) & VRAM_ADDR_MASK;
    }

    /// PPUSTATUS read: returns the flags, then clears VBLANK and the toggle.
    pub fn read_status(&mut self) -> u8 {
        let value = self.status.bits();
        self.status.remove(PpuStatus::VBLANK);
        self.w = false;
        value
    }
}
