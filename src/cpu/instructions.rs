//! Instruction handlers. Each one receives the resolved operand and touches
//! only the flags the real instruction affects.

use super::addressing::Operand;
use super::opcodes::Mnemonic;
use super::{read_vector, Cpu, CpuBus, StatusFlags, IRQ_VECTOR};

impl Cpu {
    pub(super) fn execute(&mut self, mnemonic: Mnemonic, operand: Operand, bus: &mut dyn CpuBus) {
        match mnemonic {
            // Loads, stores, transfers
            Mnemonic::Lda => {
                self.a = self.load(bus, operand);
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.load(bus, operand);
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.load(bus, operand);
                self.set_zero_negative_flags(self.y);
            }
            Mnemonic::Sta => self.store(bus, operand, self.a),
            Mnemonic::Stx => self.store(bus, operand, self.x),
            Mnemonic::Sty => self.store(bus, operand, self.y),
            Mnemonic::Tax => {
                self.x = self.a;
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.set_zero_negative_flags(self.y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::Txs => self.sp = self.x,

            // Logic and arithmetic
            Mnemonic::Ora => self.ora(bus, operand),
            Mnemonic::And => {
                let value = self.load(bus, operand);
                self.a &= value;
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::Eor => {
                let value = self.load(bus, operand);
                self.a ^= value;
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::Bit => self.bit(bus, operand),
            Mnemonic::Adc => {
                let value = self.load(bus, operand);
                self.add_with_carry(value);
            }
            // The 2A03 has no decimal mode, so SBC is ADC of the complement.
            Mnemonic::Sbc => {
                let value = self.load(bus, operand);
                self.add_with_carry(!value);
            }
            Mnemonic::Cmp => self.compare(bus, operand, self.a),
            Mnemonic::Cpx => self.compare(bus, operand, self.x),
            Mnemonic::Cpy => self.compare(bus, operand, self.y),

            // Read-modify-write
            Mnemonic::Asl => self.asl(bus, operand),
            Mnemonic::Lsr => self.read_modify_write(bus, operand, |cpu, value| {
                cpu.status.set(StatusFlags::CARRY, value & 0x01 != 0);
                value >> 1
            }),
            Mnemonic::Rol => self.read_modify_write(bus, operand, |cpu, value| {
                let carry_in = cpu.status.contains(StatusFlags::CARRY) as u8;
                cpu.status.set(StatusFlags::CARRY, value & 0x80 != 0);
                (value << 1) | carry_in
            }),
            Mnemonic::Ror => self.read_modify_write(bus, operand, |cpu, value| {
                let carry_in = (cpu.status.contains(StatusFlags::CARRY) as u8) << 7;
                cpu.status.set(StatusFlags::CARRY, value & 0x01 != 0);
                (value >> 1) | carry_in
            }),
            Mnemonic::Inc => self.read_modify_write(bus, operand, |_, value| value.wrapping_add(1)),
            Mnemonic::Dec => self.read_modify_write(bus, operand, |_, value| value.wrapping_sub(1)),
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zero_negative_flags(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zero_negative_flags(self.y);
            }

            // Branches
            Mnemonic::Bpl => self.bpl(operand),
            Mnemonic::Bmi => self.branch(operand, self.status.contains(StatusFlags::NEGATIVE)),
            Mnemonic::Bvc => self.branch(operand, !self.status.contains(StatusFlags::OVERFLOW)),
            Mnemonic::Bvs => self.branch(operand, self.status.contains(StatusFlags::OVERFLOW)),
            Mnemonic::Bcc => self.branch(operand, !self.status.contains(StatusFlags::CARRY)),
            Mnemonic::Bcs => self.branch(operand, self.status.contains(StatusFlags::CARRY)),
            Mnemonic::Bne => self.branch(operand, !self.status.contains(StatusFlags::ZERO)),
            Mnemonic::Beq => self.branch(operand, self.status.contains(StatusFlags::ZERO)),

            // Flags
            Mnemonic::Clc => self.clc(),
            Mnemonic::Sec => self.status.insert(StatusFlags::CARRY),
            Mnemonic::Cli => self.status.remove(StatusFlags::INTERRUPT_DISABLE),
            Mnemonic::Sei => self.status.insert(StatusFlags::INTERRUPT_DISABLE),
            Mnemonic::Cld => self.status.remove(StatusFlags::DECIMAL),
            Mnemonic::Sed => self.status.insert(StatusFlags::DECIMAL),
            Mnemonic::Clv => self.status.remove(StatusFlags::OVERFLOW),

            // Stack
            Mnemonic::Pha => self.push(bus, self.a),
            Mnemonic::Php => {
                let pushed = self.status | StatusFlags::BREAK | StatusFlags::UNUSED;
                self.push(bus, pushed.bits());
            }
            Mnemonic::Pla => {
                self.a = self.pull(bus);
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::Plp => {
                let pulled = self.pull(bus);
                self.restore_status(pulled);
            }

            // Control flow
            Mnemonic::Jmp => {
                if let Operand::Address(target) = operand {
                    self.pc = target;
                }
            }
            Mnemonic::Jsr => {
                if let Operand::Address(target) = operand {
                    // Return address is the last byte of the JSR itself.
                    self.push_word(bus, self.pc.wrapping_sub(1));
                    self.pc = target;
                }
            }
            Mnemonic::Rts => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            Mnemonic::Brk => self.brk(bus),
            Mnemonic::Rti => {
                let pulled = self.pull(bus);
                self.restore_status(pulled);
                self.pc = self.pull_word(bus);
            }
            Mnemonic::Nop => {}
        }
    }

    fn load(&mut self, bus: &mut dyn CpuBus, operand: Operand) -> u8 {
        match operand {
            Operand::Register => self.a,
            Operand::Address(addr) => bus.read(addr),
        }
    }

    fn store(&mut self, bus: &mut dyn CpuBus, operand: Operand, value: u8) {
        if let Operand::Address(addr) = operand {
            bus.write(addr, value);
        }
    }

    /// Reads from the operand location, applies `op`, writes the result back
    /// to the same location and sets Z/N from it.
    fn read_modify_write(
        &mut self,
        bus: &mut dyn CpuBus,
        operand: Operand,
        op: impl FnOnce(&mut Cpu, u8) -> u8,
    ) {
        let value = self.load(bus, operand);
        let result = op(self, value);
        match operand {
            Operand::Register => self.a = result,
            Operand::Address(addr) => bus.write(addr, result),
        }
        self.set_zero_negative_flags(result);
    }

    fn ora(&mut self, bus: &mut dyn CpuBus, operand: Operand) {
        let value = self.load(bus, operand);
        self.a |= value;
        self.set_zero_negative_flags(self.a);
    }

    fn asl(&mut self, bus: &mut dyn CpuBus, operand: Operand) {
        self.read_modify_write(bus, operand, |cpu, value| {
            cpu.status.set(StatusFlags::CARRY, value & 0x80 != 0);
            value << 1
        });
    }

    fn bpl(&mut self, operand: Operand) {
        self.branch(operand, !self.status.contains(StatusFlags::NEGATIVE));
    }

    fn clc(&mut self) {
        self.status.remove(StatusFlags::CARRY);
    }

    fn bit(&mut self, bus: &mut dyn CpuBus, operand: Operand) {
        let value = self.load(bus, operand);
        self.status.set(StatusFlags::ZERO, self.a & value == 0);
        self.status.set(StatusFlags::OVERFLOW, value & 0x40 != 0);
        self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
    }

    fn add_with_carry(&mut self, value: u8) {
        let carry = self.status.contains(StatusFlags::CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.status.set(StatusFlags::CARRY, sum > 0xFF);
        self.status.set(
            StatusFlags::OVERFLOW,
            (self.a ^ result) & (value ^ result) & 0x80 != 0,
        );
        self.a = result;
        self.set_zero_negative_flags(result);
    }

    fn compare(&mut self, bus: &mut dyn CpuBus, operand: Operand, register: u8) {
        let value = self.load(bus, operand);
        self.status.set(StatusFlags::CARRY, register >= value);
        self.set_zero_negative_flags(register.wrapping_sub(value));
    }

    // The resolver already moved pc past the offset; a branch not taken
    // leaves it there.
    fn branch(&mut self, operand: Operand, condition: bool) {
        let Operand::Address(target) = operand else {
            return;
        };
        if !condition {
            return;
        }
        self.extra_cycles += if (self.pc & 0xFF00) != (target & 0xFF00) { 2 } else { 1 };
        self.pc = target;
    }

    fn brk(&mut self, bus: &mut dyn CpuBus) {
        // BRK skips a padding byte after the opcode.
        let return_pc = self.pc.wrapping_add(1);
        self.push_word(bus, return_pc);
        let pushed = self.status | StatusFlags::BREAK | StatusFlags::UNUSED;
        self.push(bus, pushed.bits());
        self.status.insert(StatusFlags::INTERRUPT_DISABLE);
        self.pc = read_vector(bus, IRQ_VECTOR);
    }

    fn restore_status(&mut self, pulled: u8) {
        self.status = (StatusFlags::from_bits_truncate(pulled) | StatusFlags::UNUSED) - StatusFlags::BREAK;
    }
}
