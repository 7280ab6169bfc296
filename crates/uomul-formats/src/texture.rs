//! Texture maps (`texmaps.mul`)
//!
//! A texture is a flat `size × size` array of pixels stored with the alpha
//! bit inverted. The edge length is not stored in the record; the index
//! `extra` selects it (`0` for 64, anything else for 128).

use crate::bytes::words_le;
use crate::error::{EncodeError, EncodeResult, FormatError, Result};

/// Edge length selected by an `extra` of zero
pub const SMALL_TEXTURE: u16 = 64;

/// Edge length selected by a nonzero `extra`
pub const LARGE_TEXTURE: u16 = 128;

/// Decoded texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Edge length, 64 or 128
    pub size: u16,
    /// Row-major pixels
    pub pixels: Vec<u16>,
}

/// Texture edge length encoded by an index `extra`
pub const fn size_from_extra(extra: i32) -> u16 {
    if extra == 0 { SMALL_TEXTURE } else { LARGE_TEXTURE }
}

/// Decode a texture record
pub fn decode_texture(raw: &[u8], extra: i32) -> Result<Texture> {
    let size = size_from_extra(extra);
    let count = usize::from(size) * usize::from(size);
    let src = words_le(raw, "texture")?;
    if src.len() < count {
        return Err(FormatError::Truncated {
            context: "texture",
            needed: count * 2,
            available: raw.len(),
        });
    }
    let pixels = src[..count].iter().map(|&p| p ^ 0x8000).collect();
    Ok(Texture { size, pixels })
}

/// Encode a texture, returning the record and the `extra` to store with it
pub fn encode_texture(texture: &Texture) -> EncodeResult<(Vec<u8>, i32)> {
    let extra = match texture.size {
        SMALL_TEXTURE => 0,
        LARGE_TEXTURE => 1,
        other => return Err(EncodeError::InvalidTextureSize(usize::from(other))),
    };
    let count = usize::from(texture.size) * usize::from(texture.size);
    if texture.pixels.len() != count {
        return Err(EncodeError::PixelCountMismatch {
            expected: count,
            actual: texture.pixels.len(),
        });
    }

    let raw = texture
        .pixels
        .iter()
        .flat_map(|&p| (p ^ 0x8000).to_le_bytes())
        .collect();
    Ok((raw, extra))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extra_selects_size() {
        assert_eq!(size_from_extra(0), 64);
        assert_eq!(size_from_extra(1), 128);
        assert_eq!(size_from_extra(-7), 128);
    }

    #[test]
    fn test_decode_flips_alpha_and_ignores_trailing_data() {
        let mut raw = vec![0u8; 64 * 64 * 2 + 6];
        raw[0..2].copy_from_slice(&0x7C00u16.to_le_bytes());
        let tex = decode_texture(&raw, 0).unwrap();
        assert_eq!(tex.size, 64);
        assert_eq!(tex.pixels.len(), 4096);
        assert_eq!(tex.pixels[0], 0xFC00);
        assert_eq!(tex.pixels[1], 0x8000);
    }

    #[test]
    fn test_decode_rejects_short_record() {
        let raw = vec![0u8; 64 * 64 * 2];
        assert!(matches!(
            decode_texture(&raw, 1),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_bad_sizes() {
        let odd = Texture {
            size: 32,
            pixels: vec![0; 32 * 32],
        };
        assert!(matches!(
            encode_texture(&odd),
            Err(EncodeError::InvalidTextureSize(32))
        ));

        let short = Texture {
            size: 64,
            pixels: vec![0; 10],
        };
        assert!(matches!(
            encode_texture(&short),
            Err(EncodeError::PixelCountMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_texture_round_trip(large in any::<bool>(), seed in any::<u16>()) {
            let size = if large { LARGE_TEXTURE } else { SMALL_TEXTURE };
            let count = usize::from(size) * usize::from(size);
            let pixels: Vec<u16> = (0..count).map(|i| seed.wrapping_mul(i as u16).wrapping_add(i as u16)).collect();
            let texture = Texture { size, pixels };

            let (raw, extra) = encode_texture(&texture).unwrap();
            prop_assert_eq!(raw.len(), count * 2);
            prop_assert_eq!(decode_texture(&raw, extra).unwrap(), texture);
        }
    }
}
