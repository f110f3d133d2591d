//! NES processing core: a 6502-family CPU and a tile/sprite PPU.
//!
//! The [`console::Console`] owns one CPU and one bus; the bus owns the PPU
//! and routes the memory-mapped register window to it. Timing between CPU
//! steps and PPU scanlines is left to the embedding driver.

pub mod bus;
pub mod console;
pub mod cpu;
pub mod debug_flags;
pub mod memory;
pub mod ppu;
pub mod save_state;

pub use console::Console;
pub use cpu::{Cpu, CpuBus, CpuError, StatusFlags};
pub use ppu::memory::Mirroring;
pub use ppu::Ppu;
