//! Light maps (`light.mul`)
//!
//! A light record is `width × height` signed bytes, each an intensity delta
//! applied to full brightness. Dimensions are packed into the index `extra`,
//! but tools disagree on which half holds the width, so both orderings are
//! tried against the record length.

use crate::error::{EncodeError, EncodeResult, FormatError, Result};

const MAX_LIGHT_PIXELS: usize = 64_000_000;

/// Decoded light map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightImage {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Raw intensity deltas, row major
    pub intensities: Vec<i8>,
}

impl LightImage {
    /// Grayscale ARGB1555 rendition of the intensities
    pub fn pixels(&self) -> Vec<u16> {
        self.intensities.iter().map(|&v| intensity_to_pixel(v)).collect()
    }
}

/// Map one intensity delta to an opaque gray pixel
pub fn intensity_to_pixel(v: i8) -> u16 {
    let c = (0x1F + i32::from(v)).clamp(0, 0x1F) as u16;
    0x8000 | (c << 10) | (c << 5) | c
}

/// Recover `(width, height)` from an index `extra`
///
/// With `a` the low and `b` the high 16 bits, `(b, a)` is preferred over
/// `(a, b)` when its area matches `length`. When neither matches, the first
/// ordering with a plausible nonzero area is returned.
pub fn dims_from_extra(length: usize, extra: i32) -> Option<(u16, u16)> {
    let a = (extra & 0xFFFF) as u16;
    let b = ((extra >> 16) & 0xFFFF) as u16;
    let area = |w: u16, h: u16| usize::from(w) * usize::from(h);
    let plausible = |w: u16, h: u16| w > 0 && h > 0 && area(w, h) <= MAX_LIGHT_PIXELS;

    [(b, a), (a, b)]
        .into_iter()
        .find(|&(w, h)| plausible(w, h) && area(w, h) == length)
        .or_else(|| [(b, a), (a, b)].into_iter().find(|&(w, h)| plausible(w, h)))
}

/// Decode a light record of known dimensions
pub fn decode_light(raw: &[u8], width: u16, height: u16) -> Result<LightImage> {
    if width == 0 || height == 0 {
        return Err(FormatError::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        });
    }
    if raw.len() != usize::from(width) * usize::from(height) {
        return Err(FormatError::UnexpectedLength {
            context: "light",
            length: raw.len(),
        });
    }
    Ok(LightImage {
        width,
        height,
        intensities: raw.iter().map(|&b| b as i8).collect(),
    })
}

/// Encode a light map, returning the record and the `extra` to store with it
///
/// The width goes in the high half of `extra`, the ordering readers try
/// first.
pub fn encode_light(light: &LightImage) -> EncodeResult<(Vec<u8>, i32)> {
    if light.width == 0 || light.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: usize::from(light.width),
            height: usize::from(light.height),
        });
    }
    let expected = usize::from(light.width) * usize::from(light.height);
    if light.intensities.len() != expected {
        return Err(EncodeError::PixelCountMismatch {
            expected,
            actual: light.intensities.len(),
        });
    }
    let extra = (i32::from(light.width) << 16) | i32::from(light.height);
    Ok((light.intensities.iter().map(|&v| v as u8).collect(), extra))
}
