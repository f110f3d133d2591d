use crate::bus::Bus;
use crate::cpu::{Cpu, CpuError};
use crate::ppu::memory::Mirroring;
use crate::ppu::renderer::FrameBuffer;
use crate::ppu::Ppu;
use crate::save_state::{SaveState, StateError};

/// CPU and bus wired together. Callers drive time explicitly: `step` for one
/// instruction, `step_scanline` for the raster, `render_frame` for pixels.
pub struct Console {
    cpu: Cpu,
    bus: Bus,
}

impl Console {
    pub fn new(mirroring: Mirroring) -> Self {
        Console {
            cpu: Cpu::new(),
            bus: Bus::new(mirroring),
        }
    }

    /// Loads PRG bytes at `start`. Call `reset` afterwards to pick up the vector.
    pub fn load_program(&mut self, start: u16, program: &[u8]) {
        self.bus.load_program(start, program);
    }

    pub fn load_pattern_tables(&mut self, chr: &[u8]) {
        self.bus.ppu_mut().load_pattern_tables(chr);
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
    }

    /// Resets, then starts at `entry` if the reset vector is blank. Raw PRG
    /// images without vectors run from their load address this way.
    pub fn reset_or_start_at(&mut self, entry: u16) {
        self.reset();
        if self.cpu.pc == 0x0000 {
            log::debug!("Reset vector is blank, starting at ${:04X}", entry);
            self.cpu.pc = entry;
        }
    }

    pub fn step(&mut self) -> Result<u8, CpuError> {
        self.cpu.step(&mut self.bus)
    }

    /// Advances the PPU one scanline and delivers NMI to the CPU when the
    /// PPU requests it. Returns whether an NMI was taken. A halted CPU takes
    /// no NMI, so its PC stays on the faulting opcode.
    pub fn step_scanline(&mut self) -> bool {
        let nmi = self.bus.ppu_mut().step_scanline();
        if nmi && !self.cpu.is_halted() {
            self.cpu.nmi(&mut self.bus);
            return true;
        }
        false
    }

    pub fn render_frame(&mut self) -> &FrameBuffer {
        self.bus.ppu_mut().render_frame();
        self.bus.ppu().frame_buffer()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        self.bus.ppu().frame_buffer()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        self.bus.ppu()
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn save_state(&self) -> SaveState {
        SaveState::capture(&self.cpu, &self.bus)
    }

    pub fn load_state(&mut self, state: &SaveState) -> Result<(), StateError> {
        state.restore(&mut self.cpu, &mut self.bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::RESET_VECTOR;
    use crate::ppu::{SCANLINES_PER_FRAME, VBLANK_SCANLINE};

    fn console_with(program: &[u8]) -> Console {
        let mut console = Console::new(Mirroring::Horizontal);
        console.load_program(0x8000, program);
        console.load_program(RESET_VECTOR, &[0x00, 0x80]);
        console.reset();
        console
    }

    #[test]
    fn test_reset_reads_vector() {
        let console = console_with(&[0xEA]);
        assert_eq!(console.cpu().pc, 0x8000);
        assert_eq!(console.cpu().sp, 0xFD);
    }

    #[test]
    fn test_program_writes_ppu_through_ports() {
        // LDA #$3F; STA $2006; LDA #$00; STA $2006; LDA #$21; STA $2007
        let program = [
            0xA9, 0x3F, 0x8D, 0x06, 0x20, 0xA9, 0x00, 0x8D, 0x06, 0x20, 0xA9, 0x21, 0x8D, 0x07,
            0x20,
        ];
        let mut console = console_with(&program);
        for _ in 0..6 {
            console.step().unwrap();
        }
        assert_eq!(console.ppu().read_vram(0x3F00), 0x21);
        assert_eq!(console.ppu().read_vram(0x3F10), 0x21);
    }

    #[test]
    fn test_undefined_opcode_stops_console() {
        let mut console = console_with(&[0xEA, 0x02]);
        assert_eq!(console.step(), Ok(2));
        assert_eq!(
            console.step(),
            Err(CpuError::UndefinedOpcode {
                opcode: 0x02,
                pc: 0x8001
            })
        );
        assert_eq!(console.cpu().pc, 0x8001);
        assert!(matches!(console.step(), Err(CpuError::Halted { .. })));
    }

    #[test]
    fn test_vblank_nmi_is_delivered() {
        let mut console = console_with(&[0xEA]);
        console.load_program(0xFFFA, &[0x00, 0x90]);
        // PPUCTRL: NMI enable
        console.bus_mut().ppu_mut().write_register(0x2000, 0x80);

        let mut taken = 0;
        for _ in 0..SCANLINES_PER_FRAME {
            if console.step_scanline() {
                taken += 1;
                assert_eq!(console.ppu().raster(), VBLANK_SCANLINE);
            }
        }

        assert_eq!(taken, 1);
        assert_eq!(console.cpu().pc, 0x9000);
        assert_eq!(console.ppu().raster(), 0);
    }

    #[test]
    fn test_no_nmi_when_disabled() {
        let mut console = console_with(&[0xEA]);
        for _ in 0..SCANLINES_PER_FRAME {
            assert!(!console.step_scanline());
        }
        assert_eq!(console.cpu().pc, 0x8000);
    }

    #[test]
    fn test_state_round_trip_through_console() {
        let mut console = console_with(&[0xA9, 0x55, 0xEA]);
        console.step().unwrap();
        let state = console.save_state();

        console.step().unwrap();
        console.cpu_mut().a = 0;
        console.load_state(&state).unwrap();

        assert_eq!(console.cpu().a, 0x55);
        assert_eq!(console.cpu().pc, 0x8002);
        assert_eq!(console.cpu().cycles(), state.cpu_cycles);
    }

    #[test]
    fn test_halted_cpu_ignores_nmi() {
        let mut console = console_with(&[0x02]);
        console.load_program(0xFFFA, &[0x00, 0x90]);
        console.bus_mut().ppu_mut().write_register(0x2000, 0x80);
        assert!(console.step().is_err());

        for _ in 0..SCANLINES_PER_FRAME {
            assert!(!console.step_scanline());
        }

        assert_eq!(console.cpu().pc, 0x8000);
        assert_eq!(console.cpu().sp, 0xFD);
        assert_eq!(
            console.step(),
            Err(CpuError::Halted {
                opcode: 0x02,
                pc: 0x8000
            })
        );
    }

    #[test]
    fn test_start_at_entry_when_vector_blank() {
        let mut console = Console::new(Mirroring::Horizontal);
        // LDA #$07 at $0600, no vectors
        console.load_program(0x0600, &[0xA9, 0x07]);
        console.reset_or_start_at(0x0600);
        assert_eq!(console.cpu().pc, 0x0600);

        console.step().unwrap();
        assert_eq!(console.cpu().a, 0x07);
    }

    #[test]
    fn test_start_at_keeps_reset_vector() {
        let mut console = Console::new(Mirroring::Horizontal);
        console.load_program(0x8000, &[0xEA]);
        console.load_program(RESET_VECTOR, &[0x00, 0x80]);

        console.reset_or_start_at(0x0600);

        assert_eq!(console.cpu().pc, 0x8000);
    }
}
