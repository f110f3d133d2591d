use crate::cpu::CpuBus;
use crate::memory::Memory;
use crate::ppu::memory::Mirroring;
use crate::ppu::{Ppu, OAM_SIZE};

pub const PPU_REGISTERS_START: u16 = 0x2000;
pub const PPU_REGISTERS_END: u16 = 0x3FFF;
pub const OAM_DMA: u16 = 0x4014;

/// CPU-side bus. Owns plain memory and the PPU, and forwards the PPU
/// register window to the PPU instead of storing it.
pub struct Bus {
    memory: Memory,
    ppu: Ppu,
}

impl Bus {
    pub fn new(mirroring: Mirroring) -> Self {
        Bus {
            memory: Memory::new(),
            ppu: Ppu::new(mirroring),
        }
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub(crate) fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Cartridge boundary: place program bytes in the address space.
    pub fn load_program(&mut self, start: u16, program: &[u8]) {
        self.memory.load(start, program);
    }

    fn oam_dma(&mut self, page: u8) {
        let start = (page as u16) << 8;
        let bytes: Vec<u8> = (0..OAM_SIZE as u16)
            .map(|offset| self.memory.read(start + offset))
            .collect();
        self.ppu.oam_dma(&bytes);
    }
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            PPU_REGISTERS_START..=PPU_REGISTERS_END => self.ppu.read_register(addr),
            _ => self.memory.read(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            PPU_REGISTERS_START..=PPU_REGISTERS_END => self.ppu.write_register(addr, data),
            OAM_DMA => self.oam_dma(data),
            _ => self.memory.write(addr, data),
        }
    }
}
