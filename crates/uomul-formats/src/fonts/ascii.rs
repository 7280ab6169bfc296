//! Indexed-glyph fonts (`fonts.mul`)
//!
//! ```text
//! Font × 10
//! ├── header: u8
//! └── Glyph × 224
//!     ├── width:  u8
//!     ├── height: u8
//!     ├── unused: u8
//!     └── pixels: u16 × width × height (0 = transparent, else alpha inverted)
//! ```

use crate::MulFormat;
use crate::error::{EncodeError, EncodeResult, FormatError, Result};

/// Fonts stored in `fonts.mul`
pub const ASCII_FONT_COUNT: usize = 10;

/// Glyphs per font, covering code points 0x20 upwards
pub const ASCII_GLYPH_COUNT: usize = 224;

/// One glyph
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AsciiGlyph {
    /// Width in pixels
    pub width: u8,
    /// Height in pixels
    pub height: u8,
    /// Unused header byte, preserved for round trips
    pub unknown: u8,
    /// Row-major pixels, empty when either dimension is zero
    pub pixels: Vec<u16>,
}

impl AsciiGlyph {
    /// Whether the glyph has pixels to draw
    pub fn is_renderable(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.pixels.is_empty()
    }
}

/// One font of 224 glyphs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiFont {
    /// Font header byte
    pub header: u8,
    /// Glyphs for code points 0x20..0x100
    pub glyphs: Vec<AsciiGlyph>,
}

/// Glyph slot for a character
///
/// Code points below 0x20 wrap around instead of going negative.
pub fn glyph_index(ch: char) -> usize {
    let offset = (i64::from(u32::from(ch)) - 0x20) & 0x7FFF_FFFF;
    (offset % ASCII_GLYPH_COUNT as i64) as usize
}

impl AsciiFont {
    /// Glyph used to draw `ch`
    pub fn glyph(&self, ch: char) -> Option<&AsciiGlyph> {
        self.glyphs.get(glyph_index(ch))
    }

    /// Sum of glyph widths for `text`
    pub fn text_width(&self, text: &str) -> usize {
        text.chars()
            .filter_map(|ch| self.glyph(ch))
            .map(|g| usize::from(g.width))
            .sum()
    }

    /// First glyph at or after `start` that has pixels
    pub fn first_renderable(&self, start: usize) -> Option<(usize, &AsciiGlyph)> {
        self.glyphs
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, g)| g.is_renderable())
    }

    /// Tallest glyph among the printable ASCII range
    pub fn line_height(&self) -> u8 {
        self.glyphs.iter().take(96).map(|g| g.height).max().unwrap_or(0)
    }
}

/// All ten fonts of `fonts.mul`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiFonts {
    /// Fonts in file order
    pub fonts: Vec<AsciiFont>,
}

impl AsciiFonts {
    /// Font by id
    pub fn get(&self, id: usize) -> Option<&AsciiFont> {
        self.fonts.get(id)
    }
}

impl MulFormat for AsciiFonts {
    fn parse(data: &[u8]) -> Result<Self> {
        let truncated = |context, needed| FormatError::Truncated {
            context,
            needed,
            available: data.len(),
        };

        let mut off = 0usize;
        let mut fonts = Vec::with_capacity(ASCII_FONT_COUNT);
        for _ in 0..ASCII_FONT_COUNT {
            let header = *data.get(off).ok_or_else(|| truncated("font header", off + 1))?;
            off += 1;

            let mut glyphs = Vec::with_capacity(ASCII_GLYPH_COUNT);
            for _ in 0..ASCII_GLYPH_COUNT {
                let head = data
                    .get(off..off + 3)
                    .ok_or_else(|| truncated("glyph header", off + 3))?;
                let (width, height, unknown) = (head[0], head[1], head[2]);
                off += 3;

                let mut pixels = Vec::new();
                if width > 0 && height > 0 {
                    let byte_len = usize::from(width) * usize::from(height) * 2;
                    let raw = data
                        .get(off..off + byte_len)
                        .ok_or_else(|| truncated("glyph pixels", off + byte_len))?;
                    pixels = raw
                        .chunks_exact(2)
                        .map(|c| match u16::from_le_bytes([c[0], c[1]]) {
                            0 => 0,
                            v => v ^ 0x8000,
                        })
                        .collect();
                    off += byte_len;
                }

                glyphs.push(AsciiGlyph {
                    width,
                    height,
                    unknown,
                    pixels,
                });
            }
            fonts.push(AsciiFont { header, glyphs });
        }

        Ok(Self { fonts })
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        if self.fonts.len() != ASCII_FONT_COUNT {
            return Err(EncodeError::InvalidCount {
                context: "ascii fonts",
                expected: ASCII_FONT_COUNT,
                actual: self.fonts.len(),
            });
        }

        let mut out = Vec::new();
        for font in &self.fonts {
            if font.glyphs.len() != ASCII_GLYPH_COUNT {
                return Err(EncodeError::InvalidCount {
                    context: "ascii font glyphs",
                    expected: ASCII_GLYPH_COUNT,
                    actual: font.glyphs.len(),
                });
            }
            out.push(font.header);
            for glyph in &font.glyphs {
                out.extend_from_slice(&[glyph.width, glyph.height, glyph.unknown]);
                if glyph.width == 0 || glyph.height == 0 {
                    continue;
                }
                let expected = usize::from(glyph.width) * usize::from(glyph.height);
                if glyph.pixels.len() != expected {
                    return Err(EncodeError::PixelCountMismatch {
                        expected,
                        actual: glyph.pixels.len(),
                    });
                }
                for &p in &glyph.pixels {
                    let stored = if p == 0 { 0 } else { p ^ 0x8000 };
                    out.extend_from_slice(&stored.to_le_bytes());
                }
            }
        }
        Ok(out)
    }
}
