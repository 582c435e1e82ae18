pub use self::glyph::Glyph;

pub mod cff;
mod glyph;
