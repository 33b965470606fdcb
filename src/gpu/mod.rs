// these modules are re-exported as a single module

pub use self::render::*;
mod render;

pub use self::modes::*;
mod modes;

pub use self::graphic_card::*;
mod graphic_card;

pub use self::crtc::*;
mod crtc;

pub use self::dac::*;
mod dac;

pub use self::attribute::*;
mod attribute;

pub use self::planar::*;
mod planar;
