/// GraphicCard indicates the display adapter generation to emulate
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicCard {
    MDA, CGA, EGA, VGA,
}

impl GraphicCard {
    pub fn is_ega_vga(&self) -> bool {
        match *self {
            GraphicCard::EGA | GraphicCard::VGA => true,
            _ => false,
        }
    }

    pub fn is_mda(&self) -> bool {
        match *self {
            GraphicCard::MDA => true,
            _ => false,
        }
    }

    pub fn is_cga(&self) -> bool {
        match *self {
            GraphicCard::CGA => true,
            _ => false,
        }
    }

    pub fn is_vga(&self) -> bool {
        match *self {
            GraphicCard::VGA => true,
            _ => false,
        }
    }
}
