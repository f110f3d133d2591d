use bitflags::bitflags;

use crate::debug_flags;

pub mod addressing;
mod instructions;
pub mod opcodes;


pub use addressing::{AddressingMode, Operand};
pub use opcodes::{decode, Instruction, Mnemonic};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const CARRY = 0b00000001;
        const ZERO = 0b00000010;
        const INTERRUPT_DISABLE = 0b00000100;
        const DECIMAL = 0b00001000;
        const BREAK = 0b00010000;
        const UNUSED = 0b00100000;
        const OVERFLOW = 0b01000000;
        const NEGATIVE = 0b10000000;
    }
}

pub const STACK_BASE: u16 = 0x0100;
pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const POWER_ON_STATUS: u8 = 0x24;

/// Byte-addressable view of the CPU address space.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

/// Conditions that stop the fetch-decode-execute loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CpuError {
    /// The fetched byte has no entry in the dispatch table.
    #[error("undefined opcode ${opcode:02X} at ${pc:04X}")]
    UndefinedOpcode { opcode: u8, pc: u16 },
    /// `step` was called again after an undefined opcode stopped the CPU.
    #[error("cpu halted on undefined opcode ${opcode:02X} at ${pc:04X}")]
    Halted { opcode: u8, pc: u16 },
}

pub struct Cpu {
    pub a: u8,      // Accumulator
    pub x: u8,      // X register
    pub y: u8,      // Y register
    pub sp: u8,     // Stack pointer
    pub pc: u16,    // Program counter
    pub status: StatusFlags,
    cycles: u64,
    halt: Option<(u8, u16)>, // (opcode, pc) of the undefined opcode that stopped us
    page_crossed: bool,
    extra_cycles: u8,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: StatusFlags::from_bits_truncate(POWER_ON_STATUS),
            cycles: 0,
            halt: None,
            page_crossed: false,
            extra_cycles: 0,
        }
    }

    pub fn reset(&mut self, bus: &mut dyn CpuBus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = StatusFlags::from_bits_truncate(POWER_ON_STATUS);
        self.pc = read_vector(bus, RESET_VECTOR);
        self.halt = None;
        self.cycles = 7;
    }

    /// Executes exactly one instruction and returns the cycles it took.
    ///
    /// An opcode byte without a dispatch entry leaves the program counter on
    /// the faulting byte and latches the CPU in a halted state until `reset`.
    pub fn step(&mut self, bus: &mut dyn CpuBus) -> Result<u8, CpuError> {
        if let Some((opcode, pc)) = self.halt {
            return Err(CpuError::Halted { opcode, pc });
        }

        let opcode_pc = self.pc;
        let opcode = bus.read(opcode_pc);
        self.pc = self.pc.wrapping_add(1);

        let Some(instruction) = opcodes::decode(opcode) else {
            self.pc = opcode_pc;
            self.halt = Some((opcode, opcode_pc));
            log::error!(
                "Halting on undefined opcode: 0x{:02X} at PC: 0x{:04X}",
                opcode,
                opcode_pc
            );
            return Err(CpuError::UndefinedOpcode {
                opcode,
                pc: opcode_pc,
            });
        };

        if debug_flags::cpu_trace() {
            log::trace!(
                "{:04X}  {:02X}  {:?} {:?}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
                opcode_pc,
                opcode,
                instruction.mnemonic,
                instruction.mode,
                self.a,
                self.x,
                self.y,
                self.status.bits(),
                self.sp,
                self.cycles
            );
        }

        self.page_crossed = false;
        self.extra_cycles = 0;

        let operand = self.resolve(instruction.mode, bus);
        self.execute(instruction.mnemonic, operand, bus);

        let mut cycles = instruction.cycles + self.extra_cycles;
        if self.page_crossed && instruction.has_page_penalty() {
            cycles += 1;
        }
        self.cycles += cycles as u64;
        Ok(cycles)
    }

    pub fn nmi(&mut self, bus: &mut dyn CpuBus) {
        self.interrupt(bus, NMI_VECTOR);
    }

    pub fn irq(&mut self, bus: &mut dyn CpuBus) {
        // IRQ is maskable
        if self.status.contains(StatusFlags::INTERRUPT_DISABLE) {
            return;
        }
        self.interrupt(bus, IRQ_VECTOR);
    }

    fn interrupt(&mut self, bus: &mut dyn CpuBus, vector: u16) {
        self.push_word(bus, self.pc);
        let pushed = (self.status | StatusFlags::UNUSED) - StatusFlags::BREAK;
        self.push(bus, pushed.bits());
        self.status.insert(StatusFlags::INTERRUPT_DISABLE);
        self.pc = read_vector(bus, vector);
        self.cycles += 7;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    pub(crate) fn halt_state(&self) -> Option<(u8, u16)> {
        self.halt
    }

    pub(crate) fn restore_counters(&mut self, cycles: u64, halt: Option<(u8, u16)>) {
        self.cycles = cycles;
        self.halt = halt;
    }

    fn read_byte(&mut self, bus: &mut dyn CpuBus) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn read_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let low = self.read_byte(bus) as u16;
        let high = self.read_byte(bus) as u16;
        (high << 8) | low
    }

    fn push(&mut self, bus: &mut dyn CpuBus, value: u8) {
        bus.write(STACK_BASE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut dyn CpuBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | self.sp as u16)
    }

    fn push_word(&mut self, bus: &mut dyn CpuBus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pull_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let low = self.pull(bus) as u16;
        let high = self.pull(bus) as u16;
        (high << 8) | low
    }

    fn set_zero_negative_flags(&mut self, value: u8) {
        self.status.set(StatusFlags::ZERO, value == 0);
        self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
    }
}

fn read_vector(bus: &mut dyn CpuBus, vector: u16) -> u16 {
    let low = bus.read(vector) as u16;
    let high = bus.read(vector.wrapping_add(1)) as u16;
    (high << 8) | low
}
