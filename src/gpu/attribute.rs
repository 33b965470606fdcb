/// intensity steps for the two-bit channel values of the EGA palette
/// registers: off, primary, secondary, both
const EGA_LEVELS: [u8; 4] = [0x00, 0xAA, 0x55, 0xFF];

/// The EGA/VGA attribute controller on port 0x3C0: a single port that
/// alternates between address and data phase through an internal
/// flip-flop. Reads of the status ports (0x3BA / 0x3DA) reset the
/// flip-flop to the address phase.
#[derive(Clone)]
pub struct AttributeController {
    /// false = next write selects the register, true = next write is data
    data_phase: bool,

    pub index: u8,

    /// raw register file for the non-palette registers
    pub reg: [u8; 32],

    /// palette registers 0..15, already converted to packed 24-bit rgb
    pub pal: [u32; 16],
}

impl AttributeController {
    pub fn default() -> Self {
        AttributeController {
            data_phase: false,
            index: 0,
            reg: [0; 32],
            pal: [0; 16],
        }
    }

    /// a read of the input status register puts the port back in the
    /// address phase
    pub fn reset_flipflop(&mut self) {
        self.data_phase = false;
    }

    pub fn write(&mut self, data: u8) {
        if self.data_phase {
            if self.index < 16 {
                self.pal[self.index as usize] = ega_color(data);
            } else {
                self.reg[self.index as usize] = data;
            }
        } else {
            self.index = data & 0x1F;
        }
        self.data_phase = !self.data_phase;
    }
}

/// converts a 6-bit EGA palette value (..rgbRGB: primary bits 5..3,
/// secondary bits 2..0) into a packed 24-bit rgb entry
pub fn ega_color(val: u8) -> u32 {
    let channel = |primary_bit: u8, secondary_bit: u8| -> u32 {
        let primary = (val >> primary_bit) & 1;
        let secondary = (val >> secondary_bit) & 1;
        u32::from(EGA_LEVELS[(secondary << 1 | primary) as usize])
    };
    channel(5, 2) << 16 | channel(4, 1) << 8 | channel(3, 0)
}
