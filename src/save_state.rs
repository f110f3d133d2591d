use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bus::Bus;
use crate::cpu::{Cpu, StatusFlags};
use crate::ppu::memory::{Mirroring, VRAM_SIZE};
use crate::ppu::registers::{PpuControl, PpuMask, PpuStatus};
use crate::ppu::OAM_SIZE;

const RAM_IMAGE_SIZE: usize = 0x10000;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("save state I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save state encoding failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("corrupt save state: {section} holds {actual} bytes, expected {expected}")]
    Corrupt {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Machine snapshot. The frame buffer is not part of it; the next
/// `render_frame` rebuilds it from the restored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    // CPU state
    pub cpu_a: u8,
    pub cpu_x: u8,
    pub cpu_y: u8,
    pub cpu_pc: u16,
    pub cpu_sp: u8,
    pub cpu_status: u8,
    pub cpu_cycles: u64,
    pub cpu_halt: Option<(u8, u16)>,

    // PPU registers
    pub ppu_control: u8,
    pub ppu_mask: u8,
    pub ppu_status: u8,
    pub ppu_oam_addr: u8,
    pub ppu_scroll_x: u8,
    pub ppu_scroll_y: u8,
    pub ppu_addr: u16,
    pub ppu_data_buffer: u8,
    pub ppu_w: bool,
    pub ppu_raster: u16,
    pub ppu_mirroring: Mirroring,

    // PPU memory
    pub ppu_vram: Vec<u8>,
    pub ppu_oam: Vec<u8>,

    // CPU address space
    pub ram: Vec<u8>,
}

impl SaveState {
    pub fn capture(cpu: &Cpu, bus: &Bus) -> Self {
        let ppu = bus.ppu();
        let registers = &ppu.registers;
        SaveState {
            cpu_a: cpu.a,
            cpu_x: cpu.x,
            cpu_y: cpu.y,
            cpu_pc: cpu.pc,
            cpu_sp: cpu.sp,
            cpu_status: cpu.status.bits(),
            cpu_cycles: cpu.cycles(),
            cpu_halt: cpu.halt_state(),

            ppu_control: registers.control.bits(),
            ppu_mask: registers.mask.bits(),
            ppu_status: registers.status.bits(),
            ppu_oam_addr: registers.oam_addr,
            ppu_scroll_x: registers.scroll[0],
            ppu_scroll_y: registers.scroll[1],
            ppu_addr: registers.addr,
            ppu_data_buffer: registers.data_buffer,
            ppu_w: registers.w,
            ppu_raster: registers.raster,
            ppu_mirroring: ppu.mirroring(),

            ppu_vram: ppu.vram.get_cells(),
            ppu_oam: ppu.oam.to_vec(),

            ram: bus.memory().get_ram(),
        }
    }

    /// Writes the snapshot back. Section sizes are checked before anything
    /// is touched, so a corrupt state leaves the machine unchanged.
    pub fn restore(&self, cpu: &mut Cpu, bus: &mut Bus) -> Result<(), StateError> {
        check_len("ram", RAM_IMAGE_SIZE, self.ram.len())?;
        check_len("ppu_vram", VRAM_SIZE, self.ppu_vram.len())?;
        check_len("ppu_oam", OAM_SIZE, self.ppu_oam.len())?;

        cpu.a = self.cpu_a;
        cpu.x = self.cpu_x;
        cpu.y = self.cpu_y;
        cpu.pc = self.cpu_pc;
        cpu.sp = self.cpu_sp;
        cpu.status = StatusFlags::from_bits_retain(self.cpu_status);
        cpu.restore_counters(self.cpu_cycles, self.cpu_halt);

        bus.memory_mut().set_ram(&self.ram);

        let ppu = bus.ppu_mut();
        ppu.set_mirroring(self.ppu_mirroring);
        ppu.vram.set_cells(&self.ppu_vram);
        ppu.oam.copy_from_slice(&self.ppu_oam);

        let registers = &mut ppu.registers;
        registers.control = PpuControl::from_bits_retain(self.ppu_control);
        registers.mask = PpuMask::from_bits_retain(self.ppu_mask);
        registers.status = PpuStatus::from_bits_retain(self.ppu_status);
        registers.oam_addr = self.ppu_oam_addr;
        registers.scroll = [self.ppu_scroll_x, self.ppu_scroll_y];
        registers.addr = self.ppu_addr;
        registers.data_buffer = self.ppu_data_buffer;
        registers.w = self.ppu_w;
        registers.raster = self.ppu_raster;

        log::debug!(
            "Restored state: PC=${:04X} raster={} cycles={}",
            self.cpu_pc,
            self.ppu_raster,
            self.cpu_cycles
        );
        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), StateError> {
        let path = path.as_ref();
        let data = bincode::serialize(self)?;
        std::fs::write(path, data)?;
        log::debug!("Save state written to: {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<SaveState, StateError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let save_state = bincode::deserialize(&data)?;
        log::debug!("Save state loaded from: {}", path.display());
        Ok(save_state)
    }
}

fn check_len(section: &'static str, expected: usize, actual: usize) -> Result<(), StateError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StateError::Corrupt {
            section,
            expected,
            actual,
        })
    }
}
