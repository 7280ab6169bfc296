//! ARGB1555 pixels and conversion to 8-bit RGBA
//!
//! Every codec in this crate produces and consumes packed 16-bit pixels:
//!
//! ```text
//! bit 15      alpha (1 = opaque)
//! bits 10-14  red
//! bits 5-9    green
//! bits 0-4    blue
//! ```
//!
//! Turning those into an image library's buffer is left to a
//! [`PixelConverter`]. [`Argb1555`] is the stock conversion.

/// Opaque bit of an ARGB1555 pixel
pub const ALPHA_BIT: u16 = 0x8000;

/// Expand an ARGB1555 pixel to `[r, g, b, a]`
pub fn to_rgba8(pixel: u16) -> [u8; 4] {
    let expand = |c5: u16| ((u32::from(c5 & 0x1F) * 255) / 31) as u8;
    let a = if pixel & ALPHA_BIT != 0 { 255 } else { 0 };
    [expand(pixel >> 10), expand(pixel >> 5), expand(pixel), a]
}

/// Pack `[r, g, b, a]` into ARGB1555, treating any nonzero alpha as opaque
pub fn from_rgba8(rgba: [u8; 4]) -> u16 {
    let pack = |c: u8| ((u32::from(c) * 31 + 127) / 255) as u16;
    let [r, g, b, a] = rgba;
    let alpha = if a > 0 { ALPHA_BIT } else { 0 };
    alpha | (pack(r) << 10) | (pack(g) << 5) | pack(b)
}

/// Red, green and blue 5-bit channels of a pixel
pub const fn channels(pixel: u16) -> (u16, u16, u16) {
    ((pixel >> 10) & 0x1F, (pixel >> 5) & 0x1F, pixel & 0x1F)
}

/// Conversion between packed pixel buffers and 8-bit RGBA
///
/// Implementations can target any image library; the codecs only ever see
/// the packed buffers.
pub trait PixelConverter {
    /// Convert packed pixels to RGBA quadruples
    fn to_rgba8(&self, pixels: &[u16]) -> Vec<[u8; 4]>;

    /// Convert RGBA quadruples to packed pixels
    fn from_rgba8(&self, rgba: &[[u8; 4]]) -> Vec<u16>;
}

/// Straight channel scaling between 5-bit and 8-bit components
#[derive(Debug, Clone, Copy, Default)]
pub struct Argb1555;

impl PixelConverter for Argb1555 {
    fn to_rgba8(&self, pixels: &[u16]) -> Vec<[u8; 4]> {
        pixels.iter().map(|&p| to_rgba8(p)).collect()
    }

    fn from_rgba8(&self, rgba: &[[u8; 4]]) -> Vec<u16> {
        rgba.iter().map(|&c| from_rgba8(c)).collect()
    }
}

/// Build an [`image::RgbaImage`] from packed pixels
///
/// Returns `None` when the buffer does not hold `width * height` pixels.
#[cfg(feature = "image")]
pub fn to_rgba_image(
    converter: &impl PixelConverter,
    width: u32,
    height: u32,
    pixels: &[u16],
) -> Option<image::RgbaImage> {
    let raw: Vec<u8> = converter.to_rgba8(pixels).into_iter().flatten().collect();
    image::RgbaImage::from_raw(width, height, raw)
}

/// Pack an [`image::RgbaImage`] into ARGB1555 pixels
#[cfg(feature = "image")]
pub fn from_rgba_image(converter: &impl PixelConverter, img: &image::RgbaImage) -> Vec<u16> {
    let rgba: Vec<[u8; 4]> = img.pixels().map(|p| p.0).collect();
    converter.from_rgba8(&rgba)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_colors() {
        assert_eq!(to_rgba8(0x0000), [0, 0, 0, 0]);
        assert_eq!(to_rgba8(0xFFFF), [255, 255, 255, 255]);
        assert_eq!(to_rgba8(0x8000 | (0x1F << 10)), [255, 0, 0, 255]);
        assert_eq!(from_rgba8([255, 0, 0, 1]), 0x8000 | (0x1F << 10));
        assert_eq!(from_rgba8([0, 0, 255, 0]), 0x001F);
    }

    #[test]
    fn test_converter_matches_free_functions() {
        let pixels = [0x8000, 0x7FFF, 0x1234, 0xABCD];
        let rgba = Argb1555.to_rgba8(&pixels);
        assert_eq!(rgba.len(), 4);
        assert_eq!(Argb1555.from_rgba8(&rgba), pixels.to_vec());
    }

    proptest! {
        #[test]
        fn prop_packed_survives_rgba(pixel in any::<u16>()) {
            prop_assert_eq!(from_rgba8(to_rgba8(pixel)), pixel);
        }
    }
}
