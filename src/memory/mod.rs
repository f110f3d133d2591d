pub const RAM_SIZE: usize = 0x800;
pub const RAM_MIRROR_END: u16 = 0x1FFF;

/// Plain storage behind the CPU address space.
///
/// `$0000-$1FFF` folds onto the 2 KiB internal RAM; every other address is a
/// flat cell that the cartridge boundary populates (PRG, work RAM). The bus
/// intercepts the PPU register window before it reaches this type.
pub struct Memory {
    pub(crate) cells: Box<[u8; 0x10000]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: Box::new([0; 0x10000]),
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.cells[Self::canonical(addr)]
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        self.cells[Self::canonical(addr)] = data;
    }

    /// Copies `data` starting at `start`, wrapping at the top of the address space.
    pub fn load(&mut self, start: u16, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            let addr = start.wrapping_add(offset as u16);
            self.write(addr, byte);
        }
    }

    // Save state methods
    pub fn get_ram(&self) -> Vec<u8> {
        self.cells.to_vec()
    }

    pub fn set_ram(&mut self, image: &[u8]) {
        self.cells.copy_from_slice(image);
    }

    fn canonical(addr: u16) -> usize {
        match addr {
            0x0000..=RAM_MIRROR_END => (addr as usize) & (RAM_SIZE - 1),
            _ => addr as usize,
        }
    }
}
