const DEBUG_MEMORY: bool = false;

/// size of the physical address space, 1 MiB
pub const MEMORY_SIZE: usize = 0x10_0000;

/// the flat 1 MiB address space, with a parallel per-byte write protection
/// mask covering the ROM regions
#[derive(Clone)]
pub struct FlatMemory {
    pub data: Vec<u8>,
    readonly: Vec<u8>,
}

impl FlatMemory {
    pub fn default() -> Self {
        FlatMemory {
            data: vec![0u8; MEMORY_SIZE],
            readonly: vec![0u8; MEMORY_SIZE],
        }
    }

    pub fn read_u8(&self, addr: u32) -> u8 {
        let val = self.data[addr as usize];
        if DEBUG_MEMORY {
            println!("read_u8 from {:06X} = {:02X}", addr, val);
        }
        val
    }

    /// writes are silently dropped for addresses marked read-only
    pub fn write_u8(&mut self, addr: u32, data: u8) {
        if self.readonly[addr as usize] != 0 {
            return;
        }
        if DEBUG_MEMORY {
            println!("write_u8 to {:06X} = {:02X}", addr, data);
        }
        self.data[addr as usize] = data;
    }

    pub fn read(&self, addr: u32, length: usize) -> &[u8] {
        let addr = addr as usize;
        &self.data[addr..addr + length]
    }

    /// bulk write honoring the write protection mask
    pub fn write(&mut self, addr: u32, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.write_u8(addr + i as u32, *b);
        }
    }

    /// bulk write that ignores the write protection mask, used by the rom loaders
    pub fn write_unprotected(&mut self, addr: u32, data: &[u8]) {
        let addr = addr as usize;
        self.data[addr..addr + data.len()].copy_from_slice(data);
    }

    pub fn is_readonly(&self, addr: u32) -> bool {
        self.readonly[addr as usize] != 0
    }

    /// marks `length` bytes starting at `addr` as a rom region
    pub fn set_readonly(&mut self, addr: u32, length: usize) {
        let addr = addr as usize;
        for b in &mut self.readonly[addr..addr + length] {
            *b = 1;
        }
    }
}
