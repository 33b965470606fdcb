use image::{ImageBuffer, Rgb};

use crate::bios::BIOS;
use crate::cpu::{CPU, R};
use crate::gpu::attribute::{ega_color, AttributeController};
use crate::gpu::crtc::CRTC;
use crate::gpu::dac::DAC;
use crate::gpu::graphic_card::GraphicCard;
use crate::gpu::modes::{vga_mode_block, GFXMode, VideoModeBlock};
use crate::machine::Component;
use crate::memory::MMU;

#[cfg(test)]
#[path = "./render_test.rs"]
mod render_test;

const DEBUG_SET_MODE: bool = false;
const DEBUG_INTERRUPTS: bool = false;

/// scanlines of vertical blanking appended to the visible field, used by
/// the crude status register timing
const VBLANK_LINES: u32 = 45;

/// default value of the 16 EGA palette registers (..rgbRGB encoding)
const DEFAULT_EGA_PALETTE: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x14, 0x07,
    0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F,
];

/// cga palette 1 (cyan/magenta/white) mapped into the 16-color table
const CGA_PAL1_MAP: [usize; 4] = [0, 3, 5, 7];

pub struct GPU {
    pub scanline: u32,
    pub card: GraphicCard,

    /// the active video mode
    pub mode: VideoModeBlock,
    modes: Vec<VideoModeBlock>,

    /// set by int 10h when bit 7 of the mode byte asks to keep the
    /// framebuffer contents
    pub no_blanking: bool,

    pub active_page: u8,

    /// cursor position per page (row, column)
    pub cursor: [(u8, u8); 16],

    pub crtc: CRTC,
    pub dac: DAC,
    pub attribute: AttributeController,

    /// mode control latch of the mda (port 0x3B8)
    mda_control: u8,

    /// mode control and palette latches of the cga (ports 0x3D8, 0x3D9)
    cga_control: u8,
    cga_palette: u8,
}

/// one rendered frame: packed rgb, 3 bytes per pixel
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub mode: VideoModeBlock,
}

impl VideoFrame {
    /// converts a rendered frame to an ImageBuffer, used for persisting
    /// frames to disk
    pub fn draw_image(&self) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        ImageBuffer::from_fn(self.mode.swidth, self.mode.sheight, |x, y| {
            let offset = (((y * self.mode.swidth) + x) * 3) as usize;
            Rgb([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
        })
    }
}

impl Component for GPU {
    fn in_u8(&mut self, port: u16) -> Option<u8> {
        match port {
            0x03B0 | 0x03B2 | 0x03B4 | 0x03B6 |
            0x03D0 | 0x03D2 | 0x03D4 | 0x03D6 => Some(self.crtc.get_index()),
            0x03B1 | 0x03B3 | 0x03B5 | 0x03B7 |
            0x03D1 | 0x03D3 | 0x03D5 | 0x03D7 => Some(self.crtc.read_current()),
            0x03B8 => Some(self.mda_control),
            0x03BA | 0x03DA => Some(self.read_status_register()),
            0x03C6 => Some(self.dac.pel_mask),
            0x03C7 => Some(self.dac.state.register()),
            0x03C8 => Some(self.dac.get_pel_write_index()),
            0x03C9 => Some(self.dac.get_pel_data()),
            0x03D8 => Some(self.cga_control),
            0x03D9 => Some(self.cga_palette),
            _ => None,
        }
    }

    fn out_u8(&mut self, port: u16, data: u8) -> bool {
        match port {
            0x03B0 | 0x03B2 | 0x03B4 | 0x03B6 |
            0x03D0 | 0x03D2 | 0x03D4 | 0x03D6 => self.crtc.set_index(data),
            0x03B1 | 0x03B3 | 0x03B5 | 0x03B7 |
            0x03D1 | 0x03D3 | 0x03D5 | 0x03D7 => self.crtc.write_current(data),
            0x03B8 => self.mda_control = data,

            // PORT 03C0 - EGA/VGA - ATTRIBUTE CONTROLLER, address and
            // data through the internal flip-flop
            0x03C0 => self.attribute.write(data),

            // PORT 03C6-03C9 - EGA/VGA/MCGA - DAC REGISTERS
            0x03C6 => self.dac.set_pel_mask(data),
            0x03C7 => self.dac.set_pel_read_index(data),
            0x03C8 => self.dac.set_pel_write_index(data),
            0x03C9 => self.dac.set_pel_data(data),

            0x03D8 => self.cga_control = data,
            0x03D9 => self.cga_palette = data,
            _ => return false,
        }
        true
    }

    fn int(&mut self, int: u8, cpu: &mut CPU, mmu: &mut MMU) -> bool {
        if int != 0x10 {
            return false;
        }
        match cpu.get_r8(R::AH) {
            0x00 => {
                // VIDEO - SET VIDEO MODE
                let al = cpu.get_r8(R::AL);
                self.set_mode(mmu, al);
            }
            0x0F => {
                // VIDEO - GET CURRENT VIDEO MODE
                let mut al = self.mode.mode;
                if self.no_blanking {
                    al |= 0x80;
                }
                cpu.set_r8(R::AL, al);
                cpu.set_r8(R::AH, self.mode.twidth as u8);
                cpu.set_r8(R::BH, self.active_page);
            }
            _ => {
                if DEBUG_INTERRUPTS {
                    println!("int10: unhandled AH = {:02X}", cpu.get_r8(R::AH));
                }
                return false;
            }
        }
        true
    }
}

impl GPU {
    pub fn default() -> Self {
        let card = GraphicCard::VGA;
        let modes = vga_mode_block();
        let mode = modes[3].clone();
        let mut dac = DAC::default();
        let mut attribute = AttributeController::default();
        for (i, v) in DEFAULT_EGA_PALETTE.iter().enumerate() {
            attribute.pal[i] = ega_color(*v);
            dac.set_entry(i, ega_color(*v));
        }
        GPU {
            scanline: 0,
            card,
            mode,
            modes,
            no_blanking: false,
            active_page: 0,
            cursor: [(0, 0); 16],
            crtc: CRTC::default(),
            dac,
            attribute,
            mda_control: 0,
            cga_control: 0,
            cga_palette: 0,
        }
    }

    /// VIDEO - SET VIDEO MODE. bit 7 of the mode byte asks the bios not
    /// to blank the framebuffer.
    pub fn set_mode(&mut self, mmu: &mut MMU, mode: u8) {
        self.no_blanking = mode & 0x80 != 0;
        let mode = mode & 0x7F;

        let block = match self.modes.iter().find(|m| m.mode == mode) {
            Some(block) => block.clone(),
            None => {
                println!("video error: unknown video mode {:02X}", mode);
                return;
            }
        };
        if DEBUG_SET_MODE {
            println!("set_mode {:02X}: {}x{} ({}x{} text), base {:05X}",
                     mode, block.swidth, block.sheight, block.twidth, block.theight, block.pstart);
        }

        if !self.no_blanking {
            if block.pstart == 0xA0000 {
                mmu.vga.clear();
            } else {
                for off in 0..0x4000u16 {
                    mmu.write_u8_at(0xB_8000 + u32::from(off), 0);
                }
            }
        }

        self.mode = block;
        self.active_page = 0;

        // keep the bios data area in sync for guests that read it directly
        mmu.write_u8_at(BIOS::DATA_CURRENT_MODE, self.mode.mode);
        mmu.write_u16_at(BIOS::DATA_NB_COLS, self.mode.twidth as u16);
        mmu.write_u8_at(BIOS::DATA_NB_ROWS, (self.mode.theight - 1) as u8);
        mmu.write_u8_at(BIOS::DATA_CURRENT_PAGE, 0);
    }

    /// advances the crude scanline counter that feeds the status register.
    /// the emulation loop ticks this between instruction batches.
    pub fn progress_scanline(&mut self) {
        self.scanline += 1;
        if self.scanline >= self.mode.sheight + VBLANK_LINES {
            self.scanline = 0;
        }
    }

    /// input status register (0x3BA mono, 0x3DA color).
    /// bit 0 follows horizontal retrace, bit 3 follows display active.
    /// reading it also resets the attribute controller flip-flop.
    fn read_status_register(&mut self) -> u8 {
        self.attribute.reset_flipflop();
        let mut signal = 0;
        if self.scanline & 1 != 0 {
            signal |= 0x01;
        }
        if self.scanline < self.mode.sheight {
            signal |= 0x08;
        }
        signal | 0xF0
    }

    /// renders the current framebuffer contents into an rgb frame, the
    /// copy-out surface for the host presenter
    pub fn render_frame(&self, mmu: &MMU) -> VideoFrame {
        VideoFrame {
            data: match self.mode.kind {
                GFXMode::CGA4 => self.render_cga4_frame(mmu),
                GFXMode::EGA => self.render_planar_frame(mmu),
                GFXMode::VGA => self.render_mode13_frame(mmu),
                _ => {
                    // no text renderer; the presenter samples 0xB8000 itself
                    println!("XXX fixme render_frame for mode {:02X}", self.mode.mode);
                    Vec::new()
                }
            },
            mode: self.mode.clone(),
        }
    }

    /// 320x200 4 color graphics (CGA,EGA,MCGA,VGA). even scanlines at
    /// 0xB8000, odd scanlines 0x2000 above, 4 pixels per byte.
    fn render_cga4_frame(&self, mmu: &MMU) -> Vec<u8> {
        let mut buf = vec![0u8; (self.mode.swidth * self.mode.sheight * 3) as usize];
        for y in 0..self.mode.sheight {
            for x in 0..self.mode.swidth {
                let offset = 0xB_8000 + ((y % 2) * 0x2000) + 80 * (y >> 1) + (x >> 2);
                let bits = (mmu.memory.read_u8(offset) >> ((3 - (x & 3)) * 2)) & 3;
                let (r, g, b) = self.dac.rgb(CGA_PAL1_MAP[bits as usize]);
                let dst = (((y * self.mode.swidth) + x) * 3) as usize;
                buf[dst] = r;
                buf[dst + 1] = g;
                buf[dst + 2] = b;
            }
        }
        buf
    }

    /// the 16 color planar modes: one bit per pixel from each of the four
    /// planes, combined into an attribute palette index
    fn render_planar_frame(&self, mmu: &MMU) -> Vec<u8> {
        let stride = self.mode.swidth / 8;
        let mut buf = vec![0u8; (self.mode.swidth * self.mode.sheight * 3) as usize];
        for y in 0..self.mode.sheight {
            for x in 0..self.mode.swidth {
                let offset = (y * stride + x / 8) as usize;
                let bit = 7 - (x & 7);
                let mut index = 0usize;
                for plane in 0..4 {
                    index |= (((mmu.vga.plane_u8(plane, offset) >> bit) & 1) as usize) << plane;
                }
                let rgb = self.attribute.pal[index];
                let dst = (((y * self.mode.swidth) + x) * 3) as usize;
                buf[dst] = (rgb >> 16) as u8;
                buf[dst + 1] = (rgb >> 8) as u8;
                buf[dst + 2] = rgb as u8;
            }
        }
        buf
    }

    /// 320x200 256 color graphics (MCGA,VGA). chained writes land the
    /// pixel byte in every enabled plane, so plane 0 carries the image.
    fn render_mode13_frame(&self, mmu: &MMU) -> Vec<u8> {
        let mut buf = vec![0u8; (self.mode.swidth * self.mode.sheight * 3) as usize];
        for y in 0..self.mode.sheight {
            for x in 0..self.mode.swidth {
                let offset = (y * self.mode.swidth + x) as usize;
                let byte = mmu.vga.plane_u8(0, offset);
                let (r, g, b) = self.dac.rgb(byte as usize);
                let dst = (offset * 3) as usize;
                buf[dst] = r;
                buf[dst + 1] = g;
                buf[dst + 2] = b;
            }
        }
        buf
    }
}
