#[cfg(test)]
#[path = "./modes_test.rs"]
mod modes_test;

#[derive(Clone, Debug, PartialEq)]
pub enum GFXMode {
    TEXT,
    CGA2,
    CGA4,
    EGA,
    VGA,
}

impl Default for GFXMode {
    fn default() -> Self { GFXMode::TEXT }
}

/// one BIOS video mode: text geometry, pixel geometry and framebuffer base
#[derive(Clone, Default)]
pub struct VideoModeBlock {
    pub mode: u8,
    pub kind: GFXMode,
    pub twidth: usize,
    pub theight: usize,
    pub swidth: u32,
    pub sheight: u32,
    pub pstart: u32,
}

impl VideoModeBlock {
    pub fn is_text(&self) -> bool {
        self.kind == GFXMode::TEXT
    }
}

/// the mode set of a VGA with a color display, which also covers the modes
/// the older adapters can reach
pub fn vga_mode_block() -> Vec<VideoModeBlock> {
    vec![
        VideoModeBlock{mode: 0x00, kind: GFXMode::TEXT, twidth: 40, theight: 25, swidth: 320, sheight: 200, pstart: 0xB8000},
        VideoModeBlock{mode: 0x01, kind: GFXMode::TEXT, twidth: 40, theight: 25, swidth: 320, sheight: 200, pstart: 0xB8000},
        VideoModeBlock{mode: 0x02, kind: GFXMode::TEXT, twidth: 80, theight: 25, swidth: 640, sheight: 200, pstart: 0xB8000},
        VideoModeBlock{mode: 0x03, kind: GFXMode::TEXT, twidth: 80, theight: 25, swidth: 640, sheight: 200, pstart: 0xB8000},
        VideoModeBlock{mode: 0x04, kind: GFXMode::CGA4, twidth: 40, theight: 25, swidth: 320, sheight: 200, pstart: 0xB8000},
        VideoModeBlock{mode: 0x05, kind: GFXMode::CGA4, twidth: 40, theight: 25, swidth: 320, sheight: 200, pstart: 0xB8000},
        VideoModeBlock{mode: 0x06, kind: GFXMode::CGA2, twidth: 80, theight: 25, swidth: 640, sheight: 200, pstart: 0xB8000},
        VideoModeBlock{mode: 0x07, kind: GFXMode::TEXT, twidth: 80, theight: 25, swidth: 720, sheight: 350, pstart: 0xB8000},
        VideoModeBlock{mode: 0x0D, kind: GFXMode::EGA,  twidth: 40, theight: 25, swidth: 320, sheight: 200, pstart: 0xA0000},
        VideoModeBlock{mode: 0x0E, kind: GFXMode::EGA,  twidth: 80, theight: 25, swidth: 640, sheight: 200, pstart: 0xA0000},
        VideoModeBlock{mode: 0x0F, kind: GFXMode::EGA,  twidth: 80, theight: 25, swidth: 640, sheight: 350, pstart: 0xA0000},
        VideoModeBlock{mode: 0x10, kind: GFXMode::EGA,  twidth: 80, theight: 25, swidth: 640, sheight: 350, pstart: 0xA0000},
        VideoModeBlock{mode: 0x11, kind: GFXMode::EGA,  twidth: 80, theight: 30, swidth: 640, sheight: 480, pstart: 0xA0000},
        VideoModeBlock{mode: 0x12, kind: GFXMode::EGA,  twidth: 80, theight: 30, swidth: 640, sheight: 480, pstart: 0xA0000},
        VideoModeBlock{mode: 0x13, kind: GFXMode::VGA,  twidth: 40, theight: 25, swidth: 320, sheight: 200, pstart: 0xA0000},
    ]
}
