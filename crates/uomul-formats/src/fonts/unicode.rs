//! Bitmap-glyph fonts (`unifont*.mul`)
//!
//! ```text
//! offsets: i32 × 65536     byte offset of each code point's glyph (0 = absent)
//! glyph:
//! ├── x_offset: i8
//! ├── y_offset: i8
//! ├── width:    u8
//! ├── height:   u8
//! └── bitmap:   height × ceil(width / 8) bytes, MSB first
//! ```
//!
//! Writers place an i32 zero after the offset table and lay glyphs out in
//! code point order. Glyphs with a zero dimension have no bitmap and are not
//! written back: after a save their code points read as absent.

use crate::MulFormat;
use crate::error::{EncodeError, EncodeResult, FormatError, Result};

/// Code points covered by a font
pub const GLYPH_SLOTS: usize = 0x10000;

const TABLE_BYTES: usize = GLYPH_SLOTS * 4;

/// Number of `unifont*.mul` files a client may ship
pub const UNICODE_FONT_COUNT: usize = 13;

/// File name of a unicode font id (0 to 12)
pub fn unifont_filename(id: usize) -> Option<String> {
    match id {
        0 => Some("unifont.mul".to_string()),
        1..UNICODE_FONT_COUNT => Some(format!("unifont{id}.mul")),
        _ => None,
    }
}

/// One glyph
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnicodeGlyph {
    /// Horizontal placement offset
    pub x_offset: i8,
    /// Vertical placement offset
    pub y_offset: i8,
    /// Width in pixels
    pub width: u8,
    /// Height in pixels
    pub height: u8,
    /// Packed rows, absent when either dimension is zero
    pub data: Option<Vec<u8>>,
}

impl UnicodeGlyph {
    /// Bytes per bitmap row
    pub fn stride(&self) -> usize {
        usize::from(self.width).div_ceil(8)
    }

    /// Whether the glyph has a bitmap to draw
    pub fn is_renderable(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.is_some()
    }

    /// Whether the bit for `(x, y)` is set
    pub fn is_pixel_set(&self, x: usize, y: usize) -> bool {
        let Some(data) = &self.data else {
            return false;
        };
        if x >= usize::from(self.width) || y >= usize::from(self.height) {
            return false;
        }
        data.get(y * self.stride() + x / 8)
            .is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0)
    }

    /// Expand the bitmap to ARGB1555, set bits opaque black
    pub fn pixels(&self) -> Vec<u16> {
        if !self.is_renderable() {
            return Vec::new();
        }
        let (w, h) = (usize::from(self.width), usize::from(self.height));
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| if self.is_pixel_set(x, y) { 0x8000 } else { 0 })
            .collect()
    }
}

/// A full 65536-slot font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodeFont {
    glyphs: Vec<Option<UnicodeGlyph>>,
}

impl Default for UnicodeFont {
    fn default() -> Self {
        Self {
            glyphs: vec![None; GLYPH_SLOTS],
        }
    }
}

impl UnicodeFont {
    /// Glyph for a code point, if present
    pub fn glyph(&self, codepoint: u32) -> Option<&UnicodeGlyph> {
        self.glyphs
            .get((codepoint & 0xFFFF) as usize)
            .and_then(Option::as_ref)
    }

    /// Replace or clear the glyph of a code point
    pub fn set_glyph(&mut self, codepoint: u32, glyph: Option<UnicodeGlyph>) {
        self.glyphs[(codepoint & 0xFFFF) as usize] = glyph;
    }

    /// Number of code points with a glyph entry
    pub fn present(&self) -> usize {
        self.glyphs.iter().filter(|g| g.is_some()).count()
    }

    /// `(width, height)` of `text` including glyph offsets
    pub fn text_size(&self, text: &str) -> (i32, i32) {
        text.chars().fold((0, 0), |(w, h), ch| match self.glyph(u32::from(ch)) {
            Some(g) => (
                w + i32::from(g.width) + i32::from(g.x_offset),
                h.max(i32::from(g.height) + i32::from(g.y_offset)),
            ),
            None => (w, h),
        })
    }

    /// First renderable glyph at or after `start`
    pub fn first_renderable(&self, start: u32) -> Option<(u32, &UnicodeGlyph)> {
        (start & 0xFFFF..GLYPH_SLOTS as u32)
            .filter_map(|cp| self.glyph(cp).map(|g| (cp, g)))
            .find(|(_, g)| g.is_renderable())
    }
}

impl MulFormat for UnicodeFont {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < TABLE_BYTES {
            return Err(FormatError::Truncated {
                context: "unifont offset table",
                needed: TABLE_BYTES,
                available: data.len(),
            });
        }

        let mut font = Self::default();
        for (cp, slot) in font.glyphs.iter_mut().enumerate() {
            let at = cp * 4;
            let ptr = i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
            let Ok(ptr) = usize::try_from(ptr) else {
                continue;
            };
            if ptr == 0 || ptr + 4 > data.len() {
                continue;
            }

            let mut glyph = UnicodeGlyph {
                x_offset: data[ptr] as i8,
                y_offset: data[ptr + 1] as i8,
                width: data[ptr + 2],
                height: data[ptr + 3],
                data: None,
            };
            if glyph.width > 0 && glyph.height > 0 {
                let start = ptr + 4;
                let end = start + usize::from(glyph.height) * glyph.stride();
                // Bitmap past the end of file: treat the glyph as absent
                let Some(bitmap) = data.get(start..end) else {
                    continue;
                };
                glyph.data = Some(bitmap.to_vec());
            }
            *slot = Some(glyph);
        }

        Ok(font)
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        let mut offsets = vec![0u8; TABLE_BYTES];
        let mut body = Vec::new();
        let base = TABLE_BYTES + 4;

        for (cp, glyph) in self.glyphs.iter().enumerate() {
            let Some(glyph) = glyph else { continue };
            let Some(bitmap) = glyph.data.as_ref().filter(|_| glyph.width > 0 && glyph.height > 0)
            else {
                continue;
            };

            let expected = usize::from(glyph.height) * glyph.stride();
            if bitmap.len() != expected {
                return Err(EncodeError::GlyphDataMismatch {
                    index: cp,
                    expected,
                    actual: bitmap.len(),
                });
            }

            let pos = base + body.len();
            let pos = i32::try_from(pos).map_err(|_| EncodeError::TooLarge {
                context: "unifont glyph offset",
                size: pos,
                limit: i32::MAX as usize,
            })?;
            offsets[cp * 4..cp * 4 + 4].copy_from_slice(&pos.to_le_bytes());

            body.extend_from_slice(&[
                glyph.x_offset as u8,
                glyph.y_offset as u8,
                glyph.width,
                glyph.height,
            ]);
            body.extend_from_slice(bitmap);
        }

        let mut out = offsets;
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend(body);
        Ok(out)
    }
}
