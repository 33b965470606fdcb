// https://wiki.osdev.org/BIOS

use crate::memory::{MemoryAddress, MMU};

#[derive(Clone)]
pub struct BIOS {
}

impl BIOS {
    /// bios data area, 256 bytes at 000400 to 0004FF
    pub const DATA_CURRENT_MODE: u32 = 0x0449;
    pub const DATA_NB_COLS: u32      = 0x044A;
    pub const DATA_CURRENT_PAGE: u32 = 0x0462;
    pub const DATA_DISK_STATUS: u32  = 0x0474;
    pub const DATA_NB_ROWS: u32      = 0x0484;

    /// bios rom segment, 64k at F_0000 to F_FFFF
    pub const ROM_SEG: u16 = 0xF000;

    const ROM_EQUIPMENT_WORD: u16 = 0x0410;

    /// load addresses of the rom images
    pub const BIOS_ROM_BASE: u32   = 0xF_0000;
    pub const VIDEO_ROM_BASE: u32  = 0xC_0000;
    pub const OPTION_ROM_BASE: u32 = 0xD_0000;
    pub const BASIC_ROM_BASE: u32  = 0xF_6000;

    pub fn default() -> Self {
        BIOS {
        }
    }

    pub fn init(&mut self, mut mmu: &mut MMU) {
        self.init_ivt(&mut mmu);
        self.write_configuration_data_table(&mut mmu);
    }

    /// points every interrupt vector at an IRET stub in the rom segment,
    /// so unhandled software interrupts return cleanly until a real bios
    /// image takes over the table
    fn init_ivt(&mut self, mmu: &mut MMU) {
        const IRET: u8 = 0xCF;
        for irq in 0..=0xFF {
            mmu.write_vec(irq, MemoryAddress::RealSegmentOffset(BIOS::ROM_SEG, u16::from(irq)));
            mmu.write_u8(BIOS::ROM_SEG, u16::from(irq), IRET);
        }
    }

    /// initializes the Configuration Data Table
    fn write_configuration_data_table(&self, mmu: &mut MMU) {
        let mut addr = MemoryAddress::RealSegmentOffset(BIOS::ROM_SEG, 0xE6F5);
        mmu.write_u16(addr.segment(), addr.offset(), 8); // table size
        addr.inc_u16();
        for b in &[
            0xFE,         // model: XT
            0x00,         // submodel
            0x00,         // BIOS revision
            0b0000_0000,  // feature byte 1
            0b0000_0000,  // feature byte 2
            0b0000_0000,  // feature byte 3
            0b0000_0000,  // feature byte 4
            0b0000_0000,  // feature byte 5
        ] {
            mmu.write_u8(addr.segment(), addr.offset(), *b);
            addr.inc_u8();
        }
        mmu.write_u16(BIOS::ROM_SEG, BIOS::ROM_EQUIPMENT_WORD, 0x0021);
    }

    /// copies a rom image into memory and write-protects the region
    fn load_rom(&self, mmu: &mut MMU, base: u32, data: &[u8]) {
        mmu.memory.write_unprotected(base, data);
        mmu.memory.set_readonly(base, data.len());
    }

    /// loads the system bios image at F0000
    pub fn load_bios(&mut self, mmu: &mut MMU, data: &[u8]) {
        self.load_rom(mmu, BIOS::BIOS_ROM_BASE, data);
    }

    /// loads a video bios image at C0000
    pub fn load_video_rom(&mut self, mmu: &mut MMU, data: &[u8]) {
        self.load_rom(mmu, BIOS::VIDEO_ROM_BASE, data);
    }

    /// loads an option rom (ide) at D0000
    pub fn load_option_rom(&mut self, mmu: &mut MMU, data: &[u8]) {
        self.load_rom(mmu, BIOS::OPTION_ROM_BASE, data);
    }

    /// loads rom basic at F6000
    pub fn load_basic_rom(&mut self, mmu: &mut MMU, data: &[u8]) {
        self.load_rom(mmu, BIOS::BASIC_ROM_BASE, data);
    }
}
