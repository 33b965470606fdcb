use crate::cpu::flag::Flags;

#[cfg(test)]
#[path = "./register_test.rs"]
mod register_test;

#[derive(Copy, Clone, Default)]
pub struct Register16 {
    pub val: u16,
}

impl Register16 {
    pub fn set_hi(&mut self, val: u8) {
        self.val = (self.val & 0x00FF) | (u16::from(val) << 8);
    }
    pub fn set_lo(&mut self, val: u8) {
        self.val = (self.val & 0xFF00) | u16::from(val);
    }
    pub fn lo_u8(&self) -> u8 {
        (self.val & 0xFF) as u8
    }
    pub fn hi_u8(&self) -> u8 {
        (self.val >> 8) as u8
    }
}

/// the 8086 register set
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum R {
    AX, CX, DX, BX, SP, BP, SI, DI,
    AL, CL, DL, BL, AH, CH, DH, BH,
    ES, CS, SS, DS,
}

impl R {
    /// index of a 16-bit general register, following the 8086 reg field encoding
    pub fn index(self) -> usize {
        match self {
            R::AX | R::AL | R::ES => 0,
            R::CX | R::CL | R::CS => 1,
            R::DX | R::DL | R::SS => 2,
            R::BX | R::BL | R::DS => 3,
            R::SP | R::AH => 4,
            R::BP | R::CH => 5,
            R::SI | R::DH => 6,
            R::DI | R::BH => 7,
        }
    }

    pub fn is_segment(self) -> bool {
        match self {
            R::ES | R::CS | R::SS | R::DS => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            R::AX => "ax", R::CX => "cx", R::DX => "dx", R::BX => "bx",
            R::SP => "sp", R::BP => "bp", R::SI => "si", R::DI => "di",
            R::AL => "al", R::CL => "cl", R::DL => "dl", R::BL => "bl",
            R::AH => "ah", R::CH => "ch", R::DH => "dh", R::BH => "bh",
            R::ES => "es", R::CS => "cs", R::SS => "ss", R::DS => "ds",
        }
    }
}

/// 8-bit register from a reg field value
pub fn r8(val: u8) -> R {
    match val & 7 {
        0 => R::AL,
        1 => R::CL,
        2 => R::DL,
        3 => R::BL,
        4 => R::AH,
        5 => R::CH,
        6 => R::DH,
        _ => R::BH,
    }
}

/// 16-bit register from a reg field value
pub fn r16(val: u8) -> R {
    match val & 7 {
        0 => R::AX,
        1 => R::CX,
        2 => R::DX,
        3 => R::BX,
        4 => R::SP,
        5 => R::BP,
        6 => R::SI,
        _ => R::DI,
    }
}

/// segment register from a reg field value
pub fn sr(val: u8) -> R {
    match val & 3 {
        0 => R::ES,
        1 => R::CS,
        2 => R::SS,
        _ => R::DS,
    }
}

/// general purpose registers, segment registers, instruction pointer, flags
#[derive(Clone)]
pub struct RegisterState {
    gpr: [Register16; 8],
    sreg: [u16; 4],
    pub ip: u16,
    pub flags: Flags,
}

impl RegisterState {
    pub fn default() -> Self {
        RegisterState {
            gpr: [Register16::default(); 8],
            sreg: [0; 4],
            ip: 0,
            flags: Flags::default(),
        }
    }

    pub fn get_r8(&self, r: R) -> u8 {
        let i = r.index();
        if i < 4 {
            self.gpr[i].lo_u8()
        } else {
            self.gpr[i - 4].hi_u8()
        }
    }

    pub fn set_r8(&mut self, r: R, val: u8) {
        let i = r.index();
        if i < 4 {
            self.gpr[i].set_lo(val);
        } else {
            self.gpr[i - 4].set_hi(val);
        }
    }

    pub fn get_r16(&self, r: R) -> u16 {
        if r.is_segment() {
            self.sreg[r.index()]
        } else {
            self.gpr[r.index()].val
        }
    }

    pub fn set_r16(&mut self, r: R, val: u16) {
        if r.is_segment() {
            self.sreg[r.index()] = val;
        } else {
            self.gpr[r.index()].val = val;
        }
    }
}
