//! PPU address space: pattern tables, nametables, palette RAM.

use serde::{Deserialize, Serialize};

pub const VRAM_SIZE: usize = 0x4000;
pub const VRAM_ADDR_MASK: u16 = 0x3FFF;

pub const PATTERN_TABLE_LOW: u16 = 0x0000;
pub const PATTERN_TABLE_HIGH: u16 = 0x1000;
pub const PATTERN_TABLES_END: u16 = 0x1FFF;
pub const TILE_BYTES: u16 = 16;

pub const NAMETABLE_BASE: u16 = 0x2000;
pub const NAMETABLE_SIZE: u16 = 0x0400;
/// Attribute table offset inside each 1 KiB nametable.
pub const ATTRIBUTE_OFFSET: u16 = 0x03C0;
pub const NAMETABLE_MIRROR_END: u16 = 0x3EFF;
pub const NAMETABLE_COLUMNS: u16 = 32;
pub const ATTRIBUTE_COLUMNS: u16 = 8;

pub const PALETTE_BASE: u16 = 0x3F00;
pub const PALETTE_SIZE: u16 = 0x20;
/// Offset of the sprite palette bank from `PALETTE_BASE`.
pub const SPRITE_PALETTE_OFFSET: u16 = 0x10;
/// Palette slot every background color index that is a multiple of 4 uses.
pub const BACKDROP_INDEX: u16 = 0x10;

/// How the four logical nametable quadrants fold onto physical storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mirroring {
    /// $2000=$2400, $2800=$2C00
    Horizontal,
    /// $2000=$2800, $2400=$2C00
    Vertical,
    FourScreen,
}

/// Physical location of one logical screen quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quadrant {
    pub nametable: u16,
    pub attributes: u16,
}

impl Mirroring {
    /// Lookup from logical quadrant 0-3 to the nametable and attribute bases
    /// that back it.
    pub fn quadrants(self) -> [Quadrant; 4] {
        let tables: [u16; 4] = match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::FourScreen => [0, 1, 2, 3],
        };
        tables.map(|table| {
            let nametable = NAMETABLE_BASE + table * NAMETABLE_SIZE;
            Quadrant {
                nametable,
                attributes: nametable + ATTRIBUTE_OFFSET,
            }
        })
    }
}

/// One 8x8 tile: eight low-plane rows followed by eight high-plane rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternTile(pub [u8; TILE_BYTES as usize]);

impl PatternTile {
    /// 2-bit color index at (`row`, `column`), column 0 being the leftmost pixel.
    pub fn color(&self, row: usize, column: usize) -> u8 {
        let bit = 7 - column;
        let low = (self.0[row] >> bit) & 1;
        let high = (self.0[row + 8] >> bit) & 1;
        (high << 1) | low
    }
}

/// 16 KiB of PPU memory with the hardware mirroring rules applied on access.
#[derive(Clone)]
pub struct Vram {
    cells: Box<[u8; VRAM_SIZE]>,
    mirroring: Mirroring,
    quadrants: [Quadrant; 4],
}

impl Vram {
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            cells: Box::new([0; VRAM_SIZE]),
            mirroring,
            quadrants: mirroring.quadrants(),
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
        self.quadrants = mirroring.quadrants();
    }

    pub fn quadrant(&self, index: u8) -> Quadrant {
        self.quadrants[(index & 0x03) as usize]
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.cells[self.canonical(addr)]
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        let index = self.canonical(addr);
        self.cells[index] = data;
    }

    /// Reads backing storage directly, bypassing nametable folding. Used with
    /// addresses taken from the quadrant table, which are already physical.
    pub(crate) fn physical(&self, addr: u16) -> u8 {
        self.cells[(addr & VRAM_ADDR_MASK) as usize]
    }

    pub fn pattern(&self, base: u16, index: u8) -> PatternTile {
        let start = base + index as u16 * TILE_BYTES;
        let mut bytes = [0; TILE_BYTES as usize];
        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = self.physical(start + offset as u16);
        }
        PatternTile(bytes)
    }

    pub fn palette_entry(&self, index: u16) -> u8 {
        self.read(PALETTE_BASE + (index % PALETTE_SIZE))
    }

    /// Copies CHR data into the pattern tables, truncating at $1FFF.
    pub fn load_pattern_tables(&mut self, chr: &[u8]) {
        let len = chr.len().min(PATTERN_TABLES_END as usize + 1);
        self.cells[..len].copy_from_slice(&chr[..len]);
    }

    // Save state methods
    pub fn get_cells(&self) -> Vec<u8> {
        self.cells.to_vec()
    }

    pub fn set_cells(&mut self, image: &[u8]) {
        self.cells.copy_from_slice(image);
    }

    /// Folds any 16-bit address onto its backing cell.
    pub fn canonical(&self, addr: u16) -> usize {
        let addr = addr & VRAM_ADDR_MASK;
        let folded = match addr {
            0x0000..=PATTERN_TABLES_END => addr,
            NAMETABLE_BASE..=NAMETABLE_MIRROR_END => {
                // $3000-$3EFF repeats $2000-$2EFF
                let offset = (addr - NAMETABLE_BASE) & 0x0FFF;
                let quadrant = self.quadrants[(offset / NAMETABLE_SIZE) as usize];
                quadrant.nametable + offset % NAMETABLE_SIZE
            }
            _ => {
                let mut index = addr % PALETTE_SIZE;
                // $3F10/$3F14/$3F18/$3F1C mirror $3F00/$3F04/$3F08/$3F0C
                if index >= 0x10 && index % 4 == 0 {
                    index -= 0x10;
                }
                PALETTE_BASE + index
            }
        };
        folded as usize
    }
}
