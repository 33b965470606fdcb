use std::io;

use crate::bios::BIOS;
use crate::cpu::{r8, r16, sr, CPU, ModRM, RepeatMode, R};
use crate::cpu::modrm;
use crate::gpu::GPU as GPUComponent;
use crate::memory::{MemoryAddress, MMU};
use crate::pic::PIC as PICComponent;
use crate::storage::Storage as StorageComponent;
use crate::tools::read_binary;

#[cfg(test)]
#[path = "./machine_test.rs"]
mod machine_test;

/// prints access to I/O ports
const DEBUG_IO: bool = false;

pub enum MachineComponent {
    PIC(PICComponent),
    Storage(StorageComponent),
    GPU(GPUComponent),
}

pub trait Component {
    /// returns Some<u8> if read was handled
    fn in_u8(&mut self, _port: u16) -> Option<u8> {
        None
    }

    /// returns true if write was handled
    fn out_u8(&mut self, _port: u16, _data: u8) -> bool {
        false
    }

    /// returns true if interrupt was handled
    fn int(&mut self, _int: u8, _cpu: &mut CPU, _mmu: &mut MMU) -> bool {
        false
    }
}

pub struct Machine {
    pub mmu: MMU,
    pub bios: BIOS,
    pub cpu: CPU,

    /// handlers for i/o ports and interrupts
    components: Vec<MachineComponent>,

    /// fallback byte per port for reads and writes nothing handles
    port_shadow: Vec<u8>,
}

impl Machine {
    pub fn default() -> Self {
        let mut mmu = MMU::default();
        let mut bios = BIOS::default();
        bios.init(&mut mmu);

        let mut m = Machine {
            cpu: CPU::default(),
            mmu,
            bios,
            components: Vec::new(),
            port_shadow: vec![0u8; 0x1_0000],
        };
        m.register_components();
        m
    }

    fn register_components(&mut self) {
        self.components.push(MachineComponent::PIC(PICComponent::new(0x0020)));
        self.components.push(MachineComponent::Storage(StorageComponent::default()));

        let mut gpu = GPUComponent::default();
        gpu.set_mode(&mut self.mmu, 0x03);
        self.components.push(MachineComponent::GPU(gpu));
    }

    /// returns a mutable reference to the PIC component
    pub fn pic_mut(&mut self) -> &mut PICComponent {
        for component in &mut self.components {
            if let MachineComponent::PIC(c) = component {
                return c;
            }
        }
        unreachable!();
    }

    /// returns a mutable reference to the Storage component
    pub fn storage_mut(&mut self) -> &mut StorageComponent {
        for component in &mut self.components {
            if let MachineComponent::Storage(c) = component {
                return c;
            }
        }
        unreachable!();
    }

    /// returns a mutable reference to the GPU component
    pub fn gpu_mut(&mut self) -> &mut GPUComponent {
        for component in &mut self.components {
            if let MachineComponent::GPU(c) = component {
                return c;
            }
        }
        unreachable!();
    }

    /// returns a reference to the GPU component
    pub fn gpu(&self) -> &GPUComponent {
        for component in &self.components {
            if let MachineComponent::GPU(c) = component {
                return c;
            }
        }
        unreachable!();
    }

    /// reset the CPU to its power-on state (CS:IP at the reset vector)
    pub fn hard_reset(&mut self) {
        self.cpu = CPU::default();
        self.cpu.set_r16(R::CS, 0xFFFF);
        self.cpu.regs.ip = 0;
    }

    /// loads the system bios image file at F0000
    pub fn load_bios_file(&mut self, filename: &str) -> io::Result<()> {
        let data = read_binary(filename)?;
        self.bios.load_bios(&mut self.mmu, &data);
        Ok(())
    }

    /// loads a video bios image file at C0000
    pub fn load_video_rom_file(&mut self, filename: &str) -> io::Result<()> {
        let data = read_binary(filename)?;
        self.bios.load_video_rom(&mut self.mmu, &data);
        Ok(())
    }

    /// loads an option rom image file at D0000
    pub fn load_option_rom_file(&mut self, filename: &str) -> io::Result<()> {
        let data = read_binary(filename)?;
        self.bios.load_option_rom(&mut self.mmu, &data);
        Ok(())
    }

    /// loads a rom basic image file at F6000
    pub fn load_basic_rom_file(&mut self, filename: &str) -> io::Result<()> {
        let data = read_binary(filename)?;
        self.bios.load_basic_rom(&mut self.mmu, &data);
        Ok(())
    }

    /// places a flat code image at segment:offset and points the cpu at it,
    /// with all segment registers set up like a freshly loaded program
    pub fn load_program(&mut self, segment: u16, offset: u16, data: &[u8]) {
        self.cpu.set_r16(R::CS, segment);
        self.cpu.set_r16(R::DS, segment);
        self.cpu.set_r16(R::ES, segment);
        self.cpu.set_r16(R::SS, segment);

        // offset of last word available in first 64k segment
        self.cpu.set_r16(R::SP, 0xFFFE);
        self.cpu.regs.ip = offset;

        self.mmu.write(segment, offset, data);
    }

    /// performs the int 19h bootstrap: reads the boot sector of the drive
    /// to 0000:7C00 and transfers control to it with DL holding the drive
    pub fn boot(&mut self, drive: u8) -> bool {
        self.storage_mut().boot_drive = drive;

        let mut ok = false;
        for component in &mut self.components {
            if let MachineComponent::Storage(c) = component {
                let (transferred, _, cf) = c.read_sectors(&mut self.mmu, drive, 0, 1, 0, 1, 0x0000, 0x7C00);
                ok = !cf && transferred == 1;
            }
        }
        if !ok {
            println!("boot error: no boot sector on drive {:02X}", drive);
            return false;
        }

        self.cpu.set_r16(R::CS, 0x0000);
        self.cpu.regs.ip = 0x7C00;
        self.cpu.set_r8(R::DL, drive);
        true
    }

    /// executes enough instructions that can run for 1 video frame
    pub fn execute_frame(&mut self) {
        let fps = 60;
        let cycles = self.cpu.clock_hz / fps;

        loop {
            self.deliver_pending_interrupt();
            self.execute_instruction();
            if self.cpu.fatal_error {
                break;
            }
            if self.cpu.cycle_count > cycles {
                self.cpu.cycle_count = 0;
                break;
            }
        }
    }

    /// executes n instructions of the cpu.
    /// returns true if cpu.fatal_error was raised
    pub fn execute_instructions(&mut self, count: usize) -> bool {
        for _ in 0..count {
            self.deliver_pending_interrupt();
            self.execute_instruction();
            if self.cpu.fatal_error {
                return true;
            }
        }
        false
    }

    /// hands the highest-priority pending unmasked irq to the cpu, if the
    /// interrupt flag allows it. called between instructions; external
    /// irq producers become visible here at the latest.
    fn deliver_pending_interrupt(&mut self) {
        if !self.cpu.regs.flags.interrupt {
            return;
        }
        let vector = {
            let pic = self.pic_mut();
            if !pic.has_pending() {
                return;
            }
            match pic.next_interrupt() {
                Some(v) => v,
                None => return,
            }
        };
        self.cpu.execute_interrupt(&mut self.mmu, vector);
    }

    /// executes the next CPU instruction
    pub fn execute_instruction(&mut self) {
        if self.cpu.fatal_error {
            return;
        }
        if self.cpu.halted {
            // hlt models time passing until the next interrupt wakes us
            self.cpu.cycle_count += 1;
            return;
        }

        self.cpu.segment_override = None;
        self.cpu.repeat = RepeatMode::None;
        let start = self.cpu.get_memory_address();

        // consume prefix bytes until the opcode shows up
        let op = loop {
            let b = self.fetch_u8();
            match b {
                0x26 => self.cpu.segment_override = Some(R::ES),
                0x2E => self.cpu.segment_override = Some(R::CS),
                0x36 => self.cpu.segment_override = Some(R::SS),
                0x3E => self.cpu.segment_override = Some(R::DS),
                0xF0 => {} // lock: a single-bus machine has nothing to lock
                0xF2 => self.cpu.repeat = RepeatMode::RepNe,
                0xF3 => self.cpu.repeat = RepeatMode::Rep,
                _ => break b,
            }
        };

        self.cpu.instruction_count += 1;
        self.cpu.cycle_count += 1; // HACK: we pretend each instruction takes 1 cycle due to lack of timing

        self.run_op(start, op);

        if self.cpu.cycle_count % 100 == 0 {
            // XXX needs instruction timing to do this properly
            self.gpu_mut().progress_scanline();
        }
    }

    /// reads the next byte of the instruction stream
    fn fetch_u8(&mut self) -> u8 {
        let cs = self.cpu.get_r16(R::CS);
        let b = self.mmu.read_u8(cs, self.cpu.regs.ip);
        self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(1);
        b
    }

    fn fetch_u16(&mut self) -> u16 {
        let lo = self.fetch_u8();
        let hi = self.fetch_u8();
        u16::from(hi) << 8 | u16::from(lo)
    }

    /// decodes the mod-reg-rm byte and displacement following the opcode,
    /// advances IP past them and resolves the effective address
    fn fetch_modrm(&mut self) -> ModRM {
        let cs = self.cpu.get_r16(R::CS);
        let ip = self.cpu.regs.ip;
        let window = [
            self.mmu.read_u8(cs, ip),
            self.mmu.read_u8(cs, ip.wrapping_add(1)),
            self.mmu.read_u8(cs, ip.wrapping_add(2)),
        ];
        let mut m = modrm::decode(window);
        self.cpu.regs.ip = ip.wrapping_add(u16::from(m.num_bytes));
        self.cpu.resolve_ea(&mut m);
        m
    }

    fn read_rm8(&mut self, m: &ModRM) -> u8 {
        if m.is_register() {
            self.cpu.get_r8(r8(m.rm))
        } else {
            self.mmu.read_u8_at(m.ea)
        }
    }

    fn write_rm8(&mut self, m: &ModRM, data: u8) {
        if m.is_register() {
            self.cpu.set_r8(r8(m.rm), data);
        } else {
            self.mmu.write_u8_at(m.ea, data);
        }
    }

    fn read_rm16(&mut self, m: &ModRM) -> u16 {
        if m.is_register() {
            self.cpu.get_r16(r16(m.rm))
        } else {
            self.mmu.read_u16_at(m.ea)
        }
    }

    fn write_rm16(&mut self, m: &ModRM, data: u16) {
        if m.is_register() {
            self.cpu.set_r16(r16(m.rm), data);
        } else {
            self.mmu.write_u16_at(m.ea, data);
        }
    }

    /// read byte from I/O port
    pub fn in_u8(&mut self, port: u16) -> u8 {
        if DEBUG_IO {
            println!("in_u8: read from {:04X}", port);
        }
        match port {
            // the sequencer and graphics controller registers live with
            // the planar memory they steer
            0x03C4 | 0x03C5 | 0x03CE | 0x03CF => return self.mmu.vga.in_u8(port),
            _ => {}
        }

        for component in &mut self.components {
            let handled = match component {
                MachineComponent::PIC(c) => c.in_u8(port),
                MachineComponent::Storage(c) => c.in_u8(port),
                MachineComponent::GPU(c) => c.in_u8(port),
            };
            if let Some(v) = handled {
                return v;
            }
        }

        self.port_shadow[port as usize]
    }

    /// read word from I/O port
    pub fn in_u16(&mut self, port: u16) -> u16 {
        let lo = self.in_u8(port);
        let hi = self.in_u8(port.wrapping_add(1));
        u16::from(hi) << 8 | u16::from(lo)
    }

    /// write byte to I/O port
    pub fn out_u8(&mut self, port: u16, data: u8) {
        if DEBUG_IO {
            println!("out_u8: write to {:04X} = {:02X}", port, data);
        }
        match port {
            0x03C4 | 0x03C5 | 0x03CE | 0x03CF => return self.mmu.vga.out_u8(port, data),
            _ => {}
        }

        for component in &mut self.components {
            let handled = match component {
                MachineComponent::PIC(c) => c.out_u8(port, data),
                MachineComponent::Storage(c) => c.out_u8(port, data),
                MachineComponent::GPU(c) => c.out_u8(port, data),
            };
            if handled {
                return;
            }
        }

        self.port_shadow[port as usize] = data;
    }

    /// write word to I/O port
    pub fn out_u16(&mut self, port: u16, data: u16) {
        self.out_u8(port, data as u8);
        self.out_u8(port.wrapping_add(1), (data >> 8) as u8);
    }

    /// dispatches a software interrupt: the component services get the
    /// first shot (video and disk bios), anything they decline takes the
    /// normal vector fetch
    pub fn interrupt(&mut self, int: u8) {
        for component in &mut self.components {
            let handled = match component {
                MachineComponent::PIC(c) => c.int(int, &mut self.cpu, &mut self.mmu),
                MachineComponent::Storage(c) => c.int(int, &mut self.cpu, &mut self.mmu),
                MachineComponent::GPU(c) => c.int(int, &mut self.cpu, &mut self.mmu),
            };
            if handled {
                return;
            }
        }
        self.cpu.execute_interrupt(&mut self.mmu, int);
    }

    fn invalid_op(&mut self, start: MemoryAddress, op: u8) {
        self.cpu.fatal_error = true;
        println!("[{}] ERROR: unhandled opcode {:02X}. {} instructions executed",
                 start, op, self.cpu.instruction_count);
    }

    /// the 256-entry opcode dispatch
    fn run_op(&mut self, start: MemoryAddress, op: u8) {
        match op {
            0x00 => { // add r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_add8(dst, src);
                self.write_rm8(&m, res);
            }
            0x01 => { // add r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_add16(dst, src);
                self.write_rm16(&m, res);
            }
            0x02 => { // add r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_add8(dst, src);
                self.cpu.set_r8(r8(m.reg), res);
            }
            0x03 => { // add r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_add16(dst, src);
                self.cpu.set_r16(r16(m.reg), res);
            }
            0x04 => { // add AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                let res = self.cpu.op_add8(dst, src);
                self.cpu.set_r8(R::AL, res);
            }
            0x05 => { // add AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                let res = self.cpu.op_add16(dst, src);
                self.cpu.set_r16(R::AX, res);
            }
            0x06 => { // push es
                let v = self.cpu.get_r16(R::ES);
                self.cpu.push16(&mut self.mmu, v);
            }
            0x07 => { // pop es
                let v = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(R::ES, v);
            }
            0x08 => { // or r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_or8(dst, src);
                self.write_rm8(&m, res);
            }
            0x09 => { // or r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_or16(dst, src);
                self.write_rm16(&m, res);
            }
            0x0A => { // or r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_or8(dst, src);
                self.cpu.set_r8(r8(m.reg), res);
            }
            0x0B => { // or r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_or16(dst, src);
                self.cpu.set_r16(r16(m.reg), res);
            }
            0x0C => { // or AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                let res = self.cpu.op_or8(dst, src);
                self.cpu.set_r8(R::AL, res);
            }
            0x0D => { // or AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                let res = self.cpu.op_or16(dst, src);
                self.cpu.set_r16(R::AX, res);
            }
            0x0E => { // push cs
                let v = self.cpu.get_r16(R::CS);
                self.cpu.push16(&mut self.mmu, v);
            }
            0x0F => { // pop cs (8086 only)
                let v = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(R::CS, v);
            }
            0x10 => { // adc r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_adc8(dst, src);
                self.write_rm8(&m, res);
            }
            0x11 => { // adc r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_adc16(dst, src);
                self.write_rm16(&m, res);
            }
            0x12 => { // adc r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_adc8(dst, src);
                self.cpu.set_r8(r8(m.reg), res);
            }
            0x13 => { // adc r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_adc16(dst, src);
                self.cpu.set_r16(r16(m.reg), res);
            }
            0x14 => { // adc AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                let res = self.cpu.op_adc8(dst, src);
                self.cpu.set_r8(R::AL, res);
            }
            0x15 => { // adc AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                let res = self.cpu.op_adc16(dst, src);
                self.cpu.set_r16(R::AX, res);
            }
            0x16 => { // push ss
                let v = self.cpu.get_r16(R::SS);
                self.cpu.push16(&mut self.mmu, v);
            }
            0x17 => { // pop ss
                let v = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(R::SS, v);
            }
            0x18 => { // sbb r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_sbb8(dst, src);
                self.write_rm8(&m, res);
            }
            0x19 => { // sbb r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_sbb16(dst, src);
                self.write_rm16(&m, res);
            }
            0x1A => { // sbb r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_sbb8(dst, src);
                self.cpu.set_r8(r8(m.reg), res);
            }
            0x1B => { // sbb r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_sbb16(dst, src);
                self.cpu.set_r16(r16(m.reg), res);
            }
            0x1C => { // sbb AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                let res = self.cpu.op_sbb8(dst, src);
                self.cpu.set_r8(R::AL, res);
            }
            0x1D => { // sbb AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                let res = self.cpu.op_sbb16(dst, src);
                self.cpu.set_r16(R::AX, res);
            }
            0x1E => { // push ds
                let v = self.cpu.get_r16(R::DS);
                self.cpu.push16(&mut self.mmu, v);
            }
            0x1F => { // pop ds
                let v = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(R::DS, v);
            }
            0x20 => { // and r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_and8(dst, src);
                self.write_rm8(&m, res);
            }
            0x21 => { // and r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_and16(dst, src);
                self.write_rm16(&m, res);
            }
            0x22 => { // and r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_and8(dst, src);
                self.cpu.set_r8(r8(m.reg), res);
            }
            0x23 => { // and r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_and16(dst, src);
                self.cpu.set_r16(r16(m.reg), res);
            }
            0x24 => { // and AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                let res = self.cpu.op_and8(dst, src);
                self.cpu.set_r8(R::AL, res);
            }
            0x25 => { // and AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                let res = self.cpu.op_and16(dst, src);
                self.cpu.set_r16(R::AX, res);
            }
            0x27 => { // daa
                self.cpu.adj4(6, 0x60);
            }
            0x28 => { // sub r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_sub8(dst, src);
                self.write_rm8(&m, res);
            }
            0x29 => { // sub r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_sub16(dst, src);
                self.write_rm16(&m, res);
            }
            0x2A => { // sub r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_sub8(dst, src);
                self.cpu.set_r8(r8(m.reg), res);
            }
            0x2B => { // sub r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_sub16(dst, src);
                self.cpu.set_r16(r16(m.reg), res);
            }
            0x2C => { // sub AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                let res = self.cpu.op_sub8(dst, src);
                self.cpu.set_r8(R::AL, res);
            }
            0x2D => { // sub AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                let res = self.cpu.op_sub16(dst, src);
                self.cpu.set_r16(R::AX, res);
            }
            0x2F => { // das
                self.cpu.adj4(-6, -0x60);
            }
            0x30 => { // xor r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_xor8(dst, src);
                self.write_rm8(&m, res);
            }
            0x31 => { // xor r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_xor16(dst, src);
                self.write_rm16(&m, res);
            }
            0x32 => { // xor r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                let res = self.cpu.op_xor8(dst, src);
                self.cpu.set_r8(r8(m.reg), res);
            }
            0x33 => { // xor r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                let res = self.cpu.op_xor16(dst, src);
                self.cpu.set_r16(r16(m.reg), res);
            }
            0x34 => { // xor AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                let res = self.cpu.op_xor8(dst, src);
                self.cpu.set_r8(R::AL, res);
            }
            0x35 => { // xor AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                let res = self.cpu.op_xor16(dst, src);
                self.cpu.set_r16(R::AX, res);
            }
            0x37 => { // aaa
                let v = if self.cpu.get_r8(R::AL) > 0xF9 {
                    2
                } else {
                    1
                };
                self.cpu.adjb(6, v);
            }
            0x38 => { // cmp r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                self.cpu.cmp8(dst, src);
            }
            0x39 => { // cmp r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                self.cpu.cmp16(dst, src);
            }
            0x3A => { // cmp r8, r/m8
                let m = self.fetch_modrm();
                let src = self.read_rm8(&m);
                let dst = self.cpu.get_r8(r8(m.reg));
                self.cpu.cmp8(dst, src);
            }
            0x3B => { // cmp r16, r/m16
                let m = self.fetch_modrm();
                let src = self.read_rm16(&m);
                let dst = self.cpu.get_r16(r16(m.reg));
                self.cpu.cmp16(dst, src);
            }
            0x3C => { // cmp AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                self.cpu.cmp8(dst, src);
            }
            0x3D => { // cmp AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                self.cpu.cmp16(dst, src);
            }
            0x3F => { // aas
                let v = if self.cpu.get_r8(R::AL) < 6 {
                    -2
                } else {
                    -1
                };
                self.cpu.adjb(-6, v);
            }
            0x40..=0x47 => { // inc r16
                let r = r16(op & 7);
                let v = self.cpu.get_r16(r);
                let res = self.cpu.op_inc16(v);
                self.cpu.set_r16(r, res);
            }
            0x48..=0x4F => { // dec r16
                let r = r16(op & 7);
                let v = self.cpu.get_r16(r);
                let res = self.cpu.op_dec16(v);
                self.cpu.set_r16(r, res);
            }
            0x50..=0x57 => { // push r16
                let v = self.cpu.get_r16(r16(op & 7));
                self.cpu.push16(&mut self.mmu, v);
            }
            0x58..=0x5F => { // pop r16
                let v = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(r16(op & 7), v);
            }
            0x60 => { // pusha (80186)
                let sp = self.cpu.get_r16(R::SP);
                for r in &[R::AX, R::CX, R::DX, R::BX] {
                    let v = self.cpu.get_r16(*r);
                    self.cpu.push16(&mut self.mmu, v);
                }
                self.cpu.push16(&mut self.mmu, sp);
                for r in &[R::BP, R::SI, R::DI] {
                    let v = self.cpu.get_r16(*r);
                    self.cpu.push16(&mut self.mmu, v);
                }
            }
            0x61 => { // popa (80186)
                for r in &[R::DI, R::SI, R::BP] {
                    let v = self.cpu.pop16(&mut self.mmu);
                    self.cpu.set_r16(*r, v);
                }
                self.cpu.pop16(&mut self.mmu); // the pushed sp is skipped
                for r in &[R::BX, R::DX, R::CX, R::AX] {
                    let v = self.cpu.pop16(&mut self.mmu);
                    self.cpu.set_r16(*r, v);
                }
            }
            0x68 => { // push imm16 (80186)
                let v = self.fetch_u16();
                self.cpu.push16(&mut self.mmu, v);
            }
            0x6A => { // push imm8, sign-extended (80186)
                let v = self.fetch_u8() as i8 as u16;
                self.cpu.push16(&mut self.mmu, v);
            }
            0x70..=0x7F => { // jcc rel8
                let rel = self.fetch_u8() as i8;
                if self.cpu.condition(op & 0xF) {
                    self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(rel as u16);
                }
            }
            0x80 | 0x82 => { // <alu> r/m8, imm8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.fetch_u8();
                match m.reg {
                    0 => {
                        let res = self.cpu.op_add8(dst, src);
                        self.write_rm8(&m, res);
                    }
                    1 => {
                        let res = self.cpu.op_or8(dst, src);
                        self.write_rm8(&m, res);
                    }
                    2 => {
                        let res = self.cpu.op_adc8(dst, src);
                        self.write_rm8(&m, res);
                    }
                    3 => {
                        let res = self.cpu.op_sbb8(dst, src);
                        self.write_rm8(&m, res);
                    }
                    4 => {
                        let res = self.cpu.op_and8(dst, src);
                        self.write_rm8(&m, res);
                    }
                    5 => {
                        let res = self.cpu.op_sub8(dst, src);
                        self.write_rm8(&m, res);
                    }
                    6 => {
                        let res = self.cpu.op_xor8(dst, src);
                        self.write_rm8(&m, res);
                    }
                    _ => self.cpu.cmp8(dst, src),
                }
            }
            0x81 | 0x83 => { // <alu> r/m16, imm16 / sign-extended imm8
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = if op == 0x81 {
                    self.fetch_u16()
                } else {
                    self.fetch_u8() as i8 as u16
                };
                match m.reg {
                    0 => {
                        let res = self.cpu.op_add16(dst, src);
                        self.write_rm16(&m, res);
                    }
                    1 => {
                        let res = self.cpu.op_or16(dst, src);
                        self.write_rm16(&m, res);
                    }
                    2 => {
                        let res = self.cpu.op_adc16(dst, src);
                        self.write_rm16(&m, res);
                    }
                    3 => {
                        let res = self.cpu.op_sbb16(dst, src);
                        self.write_rm16(&m, res);
                    }
                    4 => {
                        let res = self.cpu.op_and16(dst, src);
                        self.write_rm16(&m, res);
                    }
                    5 => {
                        let res = self.cpu.op_sub16(dst, src);
                        self.write_rm16(&m, res);
                    }
                    6 => {
                        let res = self.cpu.op_xor16(dst, src);
                        self.write_rm16(&m, res);
                    }
                    _ => self.cpu.cmp16(dst, src),
                }
            }
            0x84 => { // test r/m8, r8
                let m = self.fetch_modrm();
                let dst = self.read_rm8(&m);
                let src = self.cpu.get_r8(r8(m.reg));
                self.cpu.op_and8(dst, src);
            }
            0x85 => { // test r/m16, r16
                let m = self.fetch_modrm();
                let dst = self.read_rm16(&m);
                let src = self.cpu.get_r16(r16(m.reg));
                self.cpu.op_and16(dst, src);
            }
            0x86 => { // xchg r/m8, r8
                let m = self.fetch_modrm();
                let a = self.read_rm8(&m);
                let b = self.cpu.get_r8(r8(m.reg));
                self.write_rm8(&m, b);
                self.cpu.set_r8(r8(m.reg), a);
            }
            0x87 => { // xchg r/m16, r16
                let m = self.fetch_modrm();
                let a = self.read_rm16(&m);
                let b = self.cpu.get_r16(r16(m.reg));
                self.write_rm16(&m, b);
                self.cpu.set_r16(r16(m.reg), a);
            }
            0x88 => { // mov r/m8, r8
                let m = self.fetch_modrm();
                let v = self.cpu.get_r8(r8(m.reg));
                self.write_rm8(&m, v);
            }
            0x89 => { // mov r/m16, r16
                let m = self.fetch_modrm();
                let v = self.cpu.get_r16(r16(m.reg));
                self.write_rm16(&m, v);
            }
            0x8A => { // mov r8, r/m8
                let m = self.fetch_modrm();
                let v = self.read_rm8(&m);
                self.cpu.set_r8(r8(m.reg), v);
            }
            0x8B => { // mov r16, r/m16
                let m = self.fetch_modrm();
                let v = self.read_rm16(&m);
                self.cpu.set_r16(r16(m.reg), v);
            }
            0x8C => { // mov r/m16, sreg
                let m = self.fetch_modrm();
                let v = self.cpu.get_r16(sr(m.reg));
                self.write_rm16(&m, v);
            }
            0x8D => { // lea r16, m
                let m = self.fetch_modrm();
                self.cpu.set_r16(r16(m.reg), m.offset);
            }
            0x8E => { // mov sreg, r/m16
                let m = self.fetch_modrm();
                let v = self.read_rm16(&m);
                self.cpu.set_r16(sr(m.reg), v);
            }
            0x8F => { // pop r/m16
                let m = self.fetch_modrm();
                let v = self.cpu.pop16(&mut self.mmu);
                self.write_rm16(&m, v);
            }
            0x90 => { // nop (xchg ax, ax)
            }
            0x91..=0x97 => { // xchg AX, r16
                let r = r16(op & 7);
                let a = self.cpu.get_r16(R::AX);
                let b = self.cpu.get_r16(r);
                self.cpu.set_r16(R::AX, b);
                self.cpu.set_r16(r, a);
            }
            0x98 => { // cbw
                let ah = if self.cpu.get_r8(R::AL) & 0x80 != 0 {
                    0xFF
                } else {
                    0x00
                };
                self.cpu.set_r8(R::AH, ah);
            }
            0x99 => { // cwd
                let dx = if self.cpu.get_r16(R::AX) & 0x8000 != 0 {
                    0xFFFF
                } else {
                    0
                };
                self.cpu.set_r16(R::DX, dx);
            }
            0x9A => { // call far seg:off
                let off = self.fetch_u16();
                let seg = self.fetch_u16();
                let cs = self.cpu.get_r16(R::CS);
                let ip = self.cpu.regs.ip;
                self.cpu.push16(&mut self.mmu, cs);
                self.cpu.push16(&mut self.mmu, ip);
                self.cpu.set_r16(R::CS, seg);
                self.cpu.regs.ip = off;
            }
            0x9B => { // wait: no fpu to wait for
            }
            0x9C => { // pushf
                let f = self.cpu.regs.flags.u16();
                self.cpu.push16(&mut self.mmu, f);
            }
            0x9D => { // popf
                let f = self.cpu.pop16(&mut self.mmu);
                self.cpu.regs.flags.set_u16(f);
            }
            0x9E => { // sahf
                let f = (self.cpu.regs.flags.u16() & 0xFF00) | u16::from(self.cpu.get_r8(R::AH));
                self.cpu.regs.flags.set_u16(f);
            }
            0x9F => { // lahf
                let f = self.cpu.regs.flags.u16() as u8;
                self.cpu.set_r8(R::AH, f);
            }
            0xA0 => { // mov AL, [moffs16]
                let off = self.fetch_u16();
                let seg = self.cpu.data_segment(R::DS);
                let v = self.mmu.read_u8(seg, off);
                self.cpu.set_r8(R::AL, v);
            }
            0xA1 => { // mov AX, [moffs16]
                let off = self.fetch_u16();
                let seg = self.cpu.data_segment(R::DS);
                let v = self.mmu.read_u16(seg, off);
                self.cpu.set_r16(R::AX, v);
            }
            0xA2 => { // mov [moffs16], AL
                let off = self.fetch_u16();
                let seg = self.cpu.data_segment(R::DS);
                let v = self.cpu.get_r8(R::AL);
                self.mmu.write_u8(seg, off, v);
            }
            0xA3 => { // mov [moffs16], AX
                let off = self.fetch_u16();
                let seg = self.cpu.data_segment(R::DS);
                let v = self.cpu.get_r16(R::AX);
                self.mmu.write_u16(seg, off, v);
            }
            0xA4 => { // movsb
                if self.cpu.repeat == RepeatMode::None {
                    self.movsb();
                } else {
                    while self.cpu.get_r16(R::CX) != 0 {
                        self.movsb();
                        self.dec_cx();
                    }
                }
            }
            0xA5 => { // movsw
                if self.cpu.repeat == RepeatMode::None {
                    self.movsw();
                } else {
                    while self.cpu.get_r16(R::CX) != 0 {
                        self.movsw();
                        self.dec_cx();
                    }
                }
            }
            0xA6 => { // cmpsb
                match self.cpu.repeat {
                    RepeatMode::None => self.cmpsb(),
                    rep => {
                        while self.cpu.get_r16(R::CX) != 0 {
                            self.cmpsb();
                            self.dec_cx();
                            if self.repeat_mismatch(rep) {
                                break;
                            }
                        }
                    }
                }
            }
            0xA7 => { // cmpsw
                match self.cpu.repeat {
                    RepeatMode::None => self.cmpsw(),
                    rep => {
                        while self.cpu.get_r16(R::CX) != 0 {
                            self.cmpsw();
                            self.dec_cx();
                            if self.repeat_mismatch(rep) {
                                break;
                            }
                        }
                    }
                }
            }
            0xA8 => { // test AL, imm8
                let src = self.fetch_u8();
                let dst = self.cpu.get_r8(R::AL);
                self.cpu.op_and8(dst, src);
            }
            0xA9 => { // test AX, imm16
                let src = self.fetch_u16();
                let dst = self.cpu.get_r16(R::AX);
                self.cpu.op_and16(dst, src);
            }
            0xAA => { // stosb
                if self.cpu.repeat == RepeatMode::None {
                    self.stosb();
                } else {
                    while self.cpu.get_r16(R::CX) != 0 {
                        self.stosb();
                        self.dec_cx();
                    }
                }
            }
            0xAB => { // stosw
                if self.cpu.repeat == RepeatMode::None {
                    self.stosw();
                } else {
                    while self.cpu.get_r16(R::CX) != 0 {
                        self.stosw();
                        self.dec_cx();
                    }
                }
            }
            0xAC => { // lodsb
                if self.cpu.repeat == RepeatMode::None {
                    self.lodsb();
                } else {
                    while self.cpu.get_r16(R::CX) != 0 {
                        self.lodsb();
                        self.dec_cx();
                    }
                }
            }
            0xAD => { // lodsw
                if self.cpu.repeat == RepeatMode::None {
                    self.lodsw();
                } else {
                    while self.cpu.get_r16(R::CX) != 0 {
                        self.lodsw();
                        self.dec_cx();
                    }
                }
            }
            0xAE => { // scasb
                match self.cpu.repeat {
                    RepeatMode::None => self.scasb(),
                    rep => {
                        while self.cpu.get_r16(R::CX) != 0 {
                            self.scasb();
                            self.dec_cx();
                            if self.repeat_mismatch(rep) {
                                break;
                            }
                        }
                    }
                }
            }
            0xAF => { // scasw
                match self.cpu.repeat {
                    RepeatMode::None => self.scasw(),
                    rep => {
                        while self.cpu.get_r16(R::CX) != 0 {
                            self.scasw();
                            self.dec_cx();
                            if self.repeat_mismatch(rep) {
                                break;
                            }
                        }
                    }
                }
            }
            0xB0..=0xB7 => { // mov r8, imm8
                let v = self.fetch_u8();
                self.cpu.set_r8(r8(op & 7), v);
            }
            0xB8..=0xBF => { // mov r16, imm16
                let v = self.fetch_u16();
                self.cpu.set_r16(r16(op & 7), v);
            }
            0xC0 => { // <shift> r/m8, imm8 (80186)
                let m = self.fetch_modrm();
                let count = self.fetch_u8();
                let v = self.read_rm8(&m);
                let res = self.cpu.op_shift8(m.reg, v, count);
                self.write_rm8(&m, res);
            }
            0xC1 => { // <shift> r/m16, imm8 (80186)
                let m = self.fetch_modrm();
                let count = self.fetch_u8();
                let v = self.read_rm16(&m);
                let res = self.cpu.op_shift16(m.reg, v, count);
                self.write_rm16(&m, res);
            }
            0xC2 => { // retn imm16
                let imm = self.fetch_u16();
                self.cpu.regs.ip = self.cpu.pop16(&mut self.mmu);
                let sp = self.cpu.get_r16(R::SP).wrapping_add(imm);
                self.cpu.set_r16(R::SP, sp);
            }
            0xC3 => { // retn
                self.cpu.regs.ip = self.cpu.pop16(&mut self.mmu);
            }
            0xC4 => { // les r16, m16:16
                let m = self.fetch_modrm();
                let off = self.mmu.read_u16_at(m.ea);
                let seg = self.mmu.read_u16_at(m.ea.wrapping_add(2) & 0xF_FFFF);
                self.cpu.set_r16(r16(m.reg), off);
                self.cpu.set_r16(R::ES, seg);
            }
            0xC5 => { // lds r16, m16:16
                let m = self.fetch_modrm();
                let off = self.mmu.read_u16_at(m.ea);
                let seg = self.mmu.read_u16_at(m.ea.wrapping_add(2) & 0xF_FFFF);
                self.cpu.set_r16(r16(m.reg), off);
                self.cpu.set_r16(R::DS, seg);
            }
            0xC6 => { // mov r/m8, imm8
                let m = self.fetch_modrm();
                let v = self.fetch_u8();
                self.write_rm8(&m, v);
            }
            0xC7 => { // mov r/m16, imm16
                let m = self.fetch_modrm();
                let v = self.fetch_u16();
                self.write_rm16(&m, v);
            }
            0xCA => { // retf imm16
                let imm = self.fetch_u16();
                self.cpu.regs.ip = self.cpu.pop16(&mut self.mmu);
                let cs = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(R::CS, cs);
                let sp = self.cpu.get_r16(R::SP).wrapping_add(imm);
                self.cpu.set_r16(R::SP, sp);
            }
            0xCB => { // retf
                self.cpu.regs.ip = self.cpu.pop16(&mut self.mmu);
                let cs = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(R::CS, cs);
            }
            0xCC => { // int3
                self.interrupt(3);
            }
            0xCD => { // int imm8
                let int = self.fetch_u8();
                self.interrupt(int);
            }
            0xCE => { // into
                if self.cpu.regs.flags.overflow {
                    self.interrupt(4);
                }
            }
            0xCF => { // iret
                self.cpu.regs.ip = self.cpu.pop16(&mut self.mmu);
                let cs = self.cpu.pop16(&mut self.mmu);
                self.cpu.set_r16(R::CS, cs);
                let f = self.cpu.pop16(&mut self.mmu);
                self.cpu.regs.flags.set_u16(f);
            }
            0xD0 => { // <shift> r/m8, 1
                let m = self.fetch_modrm();
                let v = self.read_rm8(&m);
                let res = self.cpu.op_shift8(m.reg, v, 1);
                self.write_rm8(&m, res);
            }
            0xD1 => { // <shift> r/m16, 1
                let m = self.fetch_modrm();
                let v = self.read_rm16(&m);
                let res = self.cpu.op_shift16(m.reg, v, 1);
                self.write_rm16(&m, res);
            }
            0xD2 => { // <shift> r/m8, CL
                let m = self.fetch_modrm();
                let count = self.cpu.get_r8(R::CL);
                let v = self.read_rm8(&m);
                let res = self.cpu.op_shift8(m.reg, v, count);
                self.write_rm8(&m, res);
            }
            0xD3 => { // <shift> r/m16, CL
                let m = self.fetch_modrm();
                let count = self.cpu.get_r8(R::CL);
                let v = self.read_rm16(&m);
                let res = self.cpu.op_shift16(m.reg, v, count);
                self.write_rm16(&m, res);
            }
            0xD4 => { // aam imm8
                let imm = self.fetch_u8();
                if imm == 0 {
                    self.interrupt(0);
                    return;
                }
                let al = self.cpu.get_r8(R::AL);
                self.cpu.set_r8(R::AH, al / imm);
                self.cpu.set_r8(R::AL, al % imm);
                let al = self.cpu.get_r8(R::AL);
                self.cpu.regs.flags.sign = al & 0x80 != 0;
                self.cpu.regs.flags.zero = al == 0;
                self.cpu.regs.flags.set_parity(al as usize);
            }
            0xD5 => { // aad imm8
                let imm = self.fetch_u8();
                let mut ax = u16::from(self.cpu.get_r8(R::AH)) * u16::from(imm);
                ax += u16::from(self.cpu.get_r8(R::AL));
                let al = ax as u8;
                self.cpu.set_r16(R::AX, u16::from(al));
                self.cpu.regs.flags.sign = al & 0x80 != 0;
                self.cpu.regs.flags.zero = al == 0;
                self.cpu.regs.flags.set_parity(al as usize);
            }
            0xD6 => { // salc (undocumented)
                let v = if self.cpu.regs.flags.carry { 0xFF } else { 0x00 };
                self.cpu.set_r8(R::AL, v);
            }
            0xD7 => { // xlat
                let seg = self.cpu.data_segment(R::DS);
                let off = self.cpu.get_r16(R::BX).wrapping_add(u16::from(self.cpu.get_r8(R::AL)));
                let v = self.mmu.read_u8(seg, off);
                self.cpu.set_r8(R::AL, v);
            }
            0xD8..=0xDF => { // esc: fpu opcodes consume their operand byte
                self.fetch_modrm();
            }
            0xE0 => { // loopnz rel8
                let rel = self.fetch_u8() as i8;
                self.dec_cx();
                if self.cpu.get_r16(R::CX) != 0 && !self.cpu.regs.flags.zero {
                    self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(rel as u16);
                }
            }
            0xE1 => { // loopz rel8
                let rel = self.fetch_u8() as i8;
                self.dec_cx();
                if self.cpu.get_r16(R::CX) != 0 && self.cpu.regs.flags.zero {
                    self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(rel as u16);
                }
            }
            0xE2 => { // loop rel8
                let rel = self.fetch_u8() as i8;
                self.dec_cx();
                if self.cpu.get_r16(R::CX) != 0 {
                    self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(rel as u16);
                }
            }
            0xE3 => { // jcxz rel8
                let rel = self.fetch_u8() as i8;
                if self.cpu.get_r16(R::CX) == 0 {
                    self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(rel as u16);
                }
            }
            0xE4 => { // in AL, imm8
                let port = u16::from(self.fetch_u8());
                let v = self.in_u8(port);
                self.cpu.set_r8(R::AL, v);
            }
            0xE5 => { // in AX, imm8
                let port = u16::from(self.fetch_u8());
                let v = self.in_u16(port);
                self.cpu.set_r16(R::AX, v);
            }
            0xE6 => { // out imm8, AL
                let port = u16::from(self.fetch_u8());
                let v = self.cpu.get_r8(R::AL);
                self.out_u8(port, v);
            }
            0xE7 => { // out imm8, AX
                let port = u16::from(self.fetch_u8());
                let v = self.cpu.get_r16(R::AX);
                self.out_u16(port, v);
            }
            0xE8 => { // call rel16
                let rel = self.fetch_u16();
                let ip = self.cpu.regs.ip;
                self.cpu.push16(&mut self.mmu, ip);
                self.cpu.regs.ip = ip.wrapping_add(rel);
            }
            0xE9 => { // jmp rel16
                let rel = self.fetch_u16();
                self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(rel);
            }
            0xEA => { // jmp far seg:off
                let off = self.fetch_u16();
                let seg = self.fetch_u16();
                self.cpu.set_r16(R::CS, seg);
                self.cpu.regs.ip = off;
            }
            0xEB => { // jmp rel8
                let rel = self.fetch_u8() as i8;
                self.cpu.regs.ip = self.cpu.regs.ip.wrapping_add(rel as u16);
            }
            0xEC => { // in AL, DX
                let port = self.cpu.get_r16(R::DX);
                let v = self.in_u8(port);
                self.cpu.set_r8(R::AL, v);
            }
            0xED => { // in AX, DX
                let port = self.cpu.get_r16(R::DX);
                let v = self.in_u16(port);
                self.cpu.set_r16(R::AX, v);
            }
            0xEE => { // out DX, AL
                let port = self.cpu.get_r16(R::DX);
                let v = self.cpu.get_r8(R::AL);
                self.out_u8(port, v);
            }
            0xEF => { // out DX, AX
                let port = self.cpu.get_r16(R::DX);
                let v = self.cpu.get_r16(R::AX);
                self.out_u16(port, v);
            }
            0xF4 => { // hlt
                self.cpu.halted = true;
            }
            0xF5 => { // cmc
                self.cpu.regs.flags.carry = !self.cpu.regs.flags.carry;
            }
            0xF6 => { // <unary> r/m8
                let m = self.fetch_modrm();
                let v = self.read_rm8(&m);
                match m.reg {
                    0 | 1 => { // test r/m8, imm8
                        let imm = self.fetch_u8();
                        self.cpu.op_and8(v, imm);
                    }
                    2 => { // not r/m8
                        self.write_rm8(&m, !v);
                    }
                    3 => { // neg r/m8
                        let res = self.cpu.op_neg8(v);
                        self.write_rm8(&m, res);
                    }
                    4 => self.cpu.op_mul8(v),
                    5 => self.cpu.op_imul8(v),
                    6 => {
                        if !self.cpu.op_div8(v) {
                            self.interrupt(0);
                        }
                    }
                    _ => {
                        if !self.cpu.op_idiv8(v) {
                            self.interrupt(0);
                        }
                    }
                }
            }
            0xF7 => { // <unary> r/m16
                let m = self.fetch_modrm();
                let v = self.read_rm16(&m);
                match m.reg {
                    0 | 1 => { // test r/m16, imm16
                        let imm = self.fetch_u16();
                        self.cpu.op_and16(v, imm);
                    }
                    2 => { // not r/m16
                        self.write_rm16(&m, !v);
                    }
                    3 => { // neg r/m16
                        let res = self.cpu.op_neg16(v);
                        self.write_rm16(&m, res);
                    }
                    4 => self.cpu.op_mul16(v),
                    5 => self.cpu.op_imul16(v),
                    6 => {
                        if !self.cpu.op_div16(v) {
                            self.interrupt(0);
                        }
                    }
                    _ => {
                        if !self.cpu.op_idiv16(v) {
                            self.interrupt(0);
                        }
                    }
                }
            }
            0xF8 => { // clc
                self.cpu.regs.flags.carry = false;
            }
            0xF9 => { // stc
                self.cpu.regs.flags.carry = true;
            }
            0xFA => { // cli
                self.cpu.regs.flags.interrupt = false;
            }
            0xFB => { // sti
                self.cpu.regs.flags.interrupt = true;
            }
            0xFC => { // cld
                self.cpu.regs.flags.direction = false;
            }
            0xFD => { // std
                self.cpu.regs.flags.direction = true;
            }
            0xFE => { // inc/dec r/m8
                let m = self.fetch_modrm();
                let v = self.read_rm8(&m);
                match m.reg {
                    0 => {
                        let res = self.cpu.op_inc8(v);
                        self.write_rm8(&m, res);
                    }
                    1 => {
                        let res = self.cpu.op_dec8(v);
                        self.write_rm8(&m, res);
                    }
                    _ => self.invalid_op(start, op),
                }
            }
            0xFF => { // <group> r/m16
                let m = self.fetch_modrm();
                match m.reg {
                    0 => { // inc r/m16
                        let v = self.read_rm16(&m);
                        let res = self.cpu.op_inc16(v);
                        self.write_rm16(&m, res);
                    }
                    1 => { // dec r/m16
                        let v = self.read_rm16(&m);
                        let res = self.cpu.op_dec16(v);
                        self.write_rm16(&m, res);
                    }
                    2 => { // call near r/m16
                        let target = self.read_rm16(&m);
                        let ip = self.cpu.regs.ip;
                        self.cpu.push16(&mut self.mmu, ip);
                        self.cpu.regs.ip = target;
                    }
                    3 => { // call far m16:16
                        let off = self.mmu.read_u16_at(m.ea);
                        let seg = self.mmu.read_u16_at(m.ea.wrapping_add(2) & 0xF_FFFF);
                        let cs = self.cpu.get_r16(R::CS);
                        let ip = self.cpu.regs.ip;
                        self.cpu.push16(&mut self.mmu, cs);
                        self.cpu.push16(&mut self.mmu, ip);
                        self.cpu.set_r16(R::CS, seg);
                        self.cpu.regs.ip = off;
                    }
                    4 => { // jmp near r/m16
                        self.cpu.regs.ip = self.read_rm16(&m);
                    }
                    5 => { // jmp far m16:16
                        let off = self.mmu.read_u16_at(m.ea);
                        let seg = self.mmu.read_u16_at(m.ea.wrapping_add(2) & 0xF_FFFF);
                        self.cpu.set_r16(R::CS, seg);
                        self.cpu.regs.ip = off;
                    }
                    6 => { // push r/m16
                        let v = self.read_rm16(&m);
                        self.cpu.push16(&mut self.mmu, v);
                    }
                    _ => self.invalid_op(start, op),
                }
            }
            _ => self.invalid_op(start, op),
        }
    }

    fn dec_cx(&mut self) {
        let cx = self.cpu.get_r16(R::CX).wrapping_sub(1);
        self.cpu.set_r16(R::CX, cx);
    }

    /// true if a repe/repne compare or scan loop should terminate on the
    /// zero flag the last comparison produced
    fn repeat_mismatch(&self, rep: RepeatMode) -> bool {
        match rep {
            RepeatMode::Rep => !self.cpu.regs.flags.zero,
            RepeatMode::RepNe => self.cpu.regs.flags.zero,
            RepeatMode::None => false,
        }
    }

    fn advance_si(&mut self, n: u16) {
        let si = self.cpu.get_r16(R::SI);
        let si = if self.cpu.regs.flags.direction {
            si.wrapping_sub(n)
        } else {
            si.wrapping_add(n)
        };
        self.cpu.set_r16(R::SI, si);
    }

    fn advance_di(&mut self, n: u16) {
        let di = self.cpu.get_r16(R::DI);
        let di = if self.cpu.regs.flags.direction {
            di.wrapping_sub(n)
        } else {
            di.wrapping_add(n)
        };
        self.cpu.set_r16(R::DI, di);
    }

    /// moves a byte from [seg:SI] to [ES:DI]. the source segment honors a
    /// segment override, the destination is always ES.
    fn movsb(&mut self) {
        let seg = self.cpu.data_segment(R::DS);
        let si = self.cpu.get_r16(R::SI);
        let v = self.mmu.read_u8(seg, si);
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        self.mmu.write_u8(es, di, v);
        self.advance_si(1);
        self.advance_di(1);
    }

    fn movsw(&mut self) {
        let seg = self.cpu.data_segment(R::DS);
        let si = self.cpu.get_r16(R::SI);
        let v = self.mmu.read_u16(seg, si);
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        self.mmu.write_u16(es, di, v);
        self.advance_si(2);
        self.advance_di(2);
    }

    fn cmpsb(&mut self) {
        let seg = self.cpu.data_segment(R::DS);
        let si = self.cpu.get_r16(R::SI);
        let src = self.mmu.read_u8(seg, si);
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        let dst = self.mmu.read_u8(es, di);
        self.cpu.cmp8(src, dst);
        self.advance_si(1);
        self.advance_di(1);
    }

    fn cmpsw(&mut self) {
        let seg = self.cpu.data_segment(R::DS);
        let si = self.cpu.get_r16(R::SI);
        let src = self.mmu.read_u16(seg, si);
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        let dst = self.mmu.read_u16(es, di);
        self.cpu.cmp16(src, dst);
        self.advance_si(2);
        self.advance_di(2);
    }

    fn stosb(&mut self) {
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        let v = self.cpu.get_r8(R::AL);
        self.mmu.write_u8(es, di, v);
        self.advance_di(1);
    }

    fn stosw(&mut self) {
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        let v = self.cpu.get_r16(R::AX);
        self.mmu.write_u16(es, di, v);
        self.advance_di(2);
    }

    /// compares AL against [ES:DI]; a segment override does not apply
    fn scasb(&mut self) {
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        let v = self.mmu.read_u8(es, di);
        let al = self.cpu.get_r8(R::AL);
        self.cpu.cmp8(al, v);
        self.advance_di(1);
    }

    fn scasw(&mut self) {
        let es = self.cpu.get_r16(R::ES);
        let di = self.cpu.get_r16(R::DI);
        let v = self.mmu.read_u16(es, di);
        let ax = self.cpu.get_r16(R::AX);
        self.cpu.cmp16(ax, v);
        self.advance_di(2);
    }

    fn lodsb(&mut self) {
        let seg = self.cpu.data_segment(R::DS);
        let si = self.cpu.get_r16(R::SI);
        let v = self.mmu.read_u8(seg, si);
        self.cpu.set_r8(R::AL, v);
        self.advance_si(1);
    }

    fn lodsw(&mut self) {
        let seg = self.cpu.data_segment(R::DS);
        let si = self.cpu.get_r16(R::SI);
        let v = self.mmu.read_u16(seg, si);
        self.cpu.set_r16(R::AX, v);
        self.advance_si(2);
    }
}
