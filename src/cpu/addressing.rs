//! Addressing mode resolution.
//!
//! Every resolver call consumes the operand bytes of the current instruction,
//! so on return the program counter points at the next opcode.

use super::{Cpu, CpuBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
            _ => 1,
        }
    }
}

/// Where an instruction reads and writes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Register-only modes (implied, accumulator).
    Register,
    Address(u16),
}

impl Cpu {
    pub(crate) fn resolve(&mut self, mode: AddressingMode, bus: &mut dyn CpuBus) -> Operand {
        match mode {
            AddressingMode::Implied | AddressingMode::Accumulator => Operand::Register,
            AddressingMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Operand::Address(addr)
            }
            AddressingMode::ZeroPage => Operand::Address(self.read_byte(bus) as u16),
            AddressingMode::ZeroPageX => Operand::Address(self.zero_page_indexed(bus, self.x)),
            AddressingMode::ZeroPageY => Operand::Address(self.zero_page_indexed(bus, self.y)),
            AddressingMode::Relative => Operand::Address(self.relative_target(bus)),
            AddressingMode::Absolute => Operand::Address(self.read_word(bus)),
            AddressingMode::AbsoluteX => Operand::Address(self.absolute_indexed(bus, self.x)),
            AddressingMode::AbsoluteY => Operand::Address(self.absolute_indexed(bus, self.y)),
            AddressingMode::Indirect => Operand::Address(self.indirect(bus)),
            AddressingMode::IndexedIndirect => Operand::Address(self.indexed_indirect(bus)),
            AddressingMode::IndirectIndexed => Operand::Address(self.indirect_indexed(bus)),
        }
    }

    fn zero_page_indexed(&mut self, bus: &mut dyn CpuBus, index: u8) -> u16 {
        let base = self.read_byte(bus);
        base.wrapping_add(index) as u16
    }

    // Branch target; the branch handler decides whether to take it.
    fn relative_target(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let offset = self.read_byte(bus) as i8;
        self.pc.wrapping_add(offset as u16)
    }

    fn absolute_indexed(&mut self, bus: &mut dyn CpuBus, index: u8) -> u16 {
        let base = self.read_word(bus);
        let addr = base.wrapping_add(index as u16);
        self.page_crossed = (base & 0xFF00) != (addr & 0xFF00);
        addr
    }

    // JMP ($xxFF) fetches the high byte from $xx00, not the next page.
    fn indirect(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let ptr = self.read_word(bus);
        let low = bus.read(ptr) as u16;
        let high_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
        let high = bus.read(high_addr) as u16;
        (high << 8) | low
    }

    fn indexed_indirect(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let base = self.read_byte(bus);
        let ptr = base.wrapping_add(self.x);
        read_zero_page_word(bus, ptr)
    }

    fn indirect_indexed(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let ptr = self.read_byte(bus);
        let base = read_zero_page_word(bus, ptr);
        let addr = base.wrapping_add(self.y as u16);
        self.page_crossed = (base & 0xFF00) != (addr & 0xFF00);
        addr
    }
}

/// Pointer reads stay inside the zero page: `$FF` pairs with `$00`.
fn read_zero_page_word(bus: &mut dyn CpuBus, ptr: u8) -> u16 {
    let low = bus.read(ptr as u16) as u16;
    let high = bus.read(ptr.wrapping_add(1) as u16) as u16;
    (high << 8) | low
}
