//! Client fonts
//!
//! Two unrelated containers share this module:
//!
//! - [`ascii`]: `fonts.mul`, ten fonts of 224 colored glyphs each
//! - [`unicode`]: `unifont*.mul`, 1-bit glyph bitmaps for the full BMP

pub mod ascii;
pub mod unicode;

pub use ascii::{AsciiFont, AsciiFonts, AsciiGlyph};
pub use unicode::{UnicodeFont, UnicodeGlyph, unifont_filename};
