//! Gump (UI artwork) codec
//!
//! ```text
//! u32 × height       row offsets, in 4-byte units from the record start
//! rows: (color: u16, run: u16) pairs covering exactly `width` pixels
//! ```
//!
//! A color of zero is a transparent run; any other color is stored with the
//! alpha bit inverted. Dimensions are not part of the record and come from
//! the index `extra` field.

use crate::bytes::words_le;
use crate::error::{EncodeError, EncodeResult, FormatError, Result};

/// Largest pixel count accepted from an index `extra` field
pub const MAX_GUMP_PIXELS: u64 = 64_000_000;

/// Decoded gump image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gump {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Row-major pixels, zero where transparent
    pub pixels: Vec<u16>,
}

/// Split a gump index `extra` into `(width, height)`
///
/// Returns `None` for the `-1` "no dimensions" marker, zero dimensions, or
/// an implausibly large image.
pub fn dimensions_from_extra(extra: i32) -> Option<(u16, u16)> {
    if extra == -1 {
        return None;
    }
    let width = ((extra >> 16) & 0xFFFF) as u16;
    let height = (extra & 0xFFFF) as u16;
    if width == 0 || height == 0 {
        return None;
    }
    if u64::from(width) * u64::from(height) > MAX_GUMP_PIXELS {
        return None;
    }
    Some((width, height))
}

/// Pack `(width, height)` into a gump index `extra`
pub fn extra_from_dimensions(width: u16, height: u16) -> i32 {
    ((u32::from(width) << 16) | u32::from(height)) as i32
}

/// Decode a gump record of known dimensions
pub fn decode_gump(raw: &[u8], width: u16, height: u16) -> Result<Gump> {
    let (w, h) = (usize::from(width), usize::from(height));
    if w == 0 || h == 0 {
        return Err(FormatError::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        });
    }
    if raw.len() < h * 4 {
        return Err(FormatError::Truncated {
            context: "gump lookups",
            needed: h * 4,
            available: raw.len(),
        });
    }
    let src = words_le(raw, "gump")?;

    let mut pixels = vec![0u16; w * h];
    for y in 0..h {
        let lookup = u32::from_le_bytes([raw[y * 4], raw[y * 4 + 1], raw[y * 4 + 2], raw[y * 4 + 3]]);
        let mut pos = (lookup as usize).saturating_mul(2);
        let mut x = 0usize;
        while x < w {
            if pos + 2 > src.len() {
                return Err(FormatError::Truncated {
                    context: "gump row",
                    needed: (pos + 2).saturating_mul(2),
                    available: raw.len(),
                });
            }
            let color = src[pos];
            let run = usize::from(src[pos + 1]);
            pos += 2;

            if run == 0 {
                return Err(FormatError::InvalidRunLength { row: y });
            }
            let end = x + run;
            if end > w {
                return Err(FormatError::RowOverrun {
                    row: y,
                    end,
                    width: w,
                });
            }
            if color != 0 {
                pixels[y * w + x..y * w + end].fill(color ^ 0x8000);
            }
            x = end;
        }
    }

    Ok(Gump {
        width,
        height,
        pixels,
    })
}

/// Encode a gump, coalescing equal neighbouring pixels into runs
///
/// Returns the record bytes; pair them with [`extra_from_dimensions`].
/// Opaque black (`0x8000`) is stored as color zero, which marks a
/// transparent run, so it is rejected.
pub fn encode_gump(gump: &Gump) -> EncodeResult<Vec<u8>> {
    let (w, h) = (usize::from(gump.width), usize::from(gump.height));
    if w == 0 || h == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    if gump.pixels.len() != w * h {
        return Err(EncodeError::PixelCountMismatch {
            expected: w * h,
            actual: gump.pixels.len(),
        });
    }
    if let Some(index) = gump.pixels.iter().position(|&p| p == 0x8000) {
        return Err(EncodeError::UnrepresentablePixel {
            context: "gump",
            index,
            value: 0x8000,
        });
    }

    // Lookup table is patched once each row's position is known
    let mut out = vec![0u8; h * 4];
    for (y, row) in gump.pixels.chunks_exact(w).enumerate() {
        let offset = u32::try_from(out.len() / 4).map_err(|_| EncodeError::TooLarge {
            context: "gump row offset",
            size: out.len() / 4,
            limit: u32::MAX as usize,
        })?;
        out[y * 4..y * 4 + 4].copy_from_slice(&offset.to_le_bytes());

        let mut x = 0usize;
        while x < w {
            let color = row[x];
            let start = x;
            while x < w && row[x] == color {
                x += 1;
            }
            let stored = if color == 0 { 0 } else { color ^ 0x8000 };
            out.extend_from_slice(&stored.to_le_bytes());
            out.extend_from_slice(&((x - start) as u16).to_le_bytes());
        }
    }

    Ok(out)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn words(ws: &[u16]) -> Vec<u8> {
        ws.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_extra_dimensions() {
        assert_eq!(dimensions_from_extra(extra_from_dimensions(640, 480)), Some((640, 480)));
        assert_eq!(dimensions_from_extra(-1), None);
        assert_eq!(dimensions_from_extra(0x0010_0000), None);
        assert_eq!(dimensions_from_extra(extra_from_dimensions(0xFFFF, 0xFFFF)), None);
    }

    #[test]
    fn test_encode_coalesces_runs() {
        let gump = Gump {
            width: 4,
            height: 1,
            pixels: vec![0xFFFF, 0xFFFF, 0, 0x801F],
        };
        let raw = encode_gump(&gump).unwrap();
        // lookup (1 word-pair = offset 1), then 3 runs
        assert_eq!(raw, words(&[1, 0, 0x7FFF, 2, 0, 1, 0x001F, 1]));
        assert_eq!(decode_gump(&raw, 4, 1).unwrap(), gump);
    }

    #[test]
    fn test_decode_rejects_overrun_and_zero_run() {
        let overrun = words(&[1, 0, 0x1234, 3]);
        assert!(matches!(
            decode_gump(&overrun, 2, 1),
            Err(FormatError::RowOverrun { row: 0, end: 3, width: 2 })
        ));

        let zero = words(&[1, 0, 0x1234, 0]);
        assert!(matches!(
            decode_gump(&zero, 2, 1),
            Err(FormatError::InvalidRunLength { row: 0 })
        ));
    }

    #[test]
    fn test_decode_rejects_truncation() {
        assert!(matches!(
            decode_gump(&[0, 0], 1, 1),
            Err(FormatError::Truncated { .. })
        ));
        // Lookup points past the end of the record
        let bad_lookup = words(&[9, 0, 0x1234, 1]);
        assert!(matches!(
            decode_gump(&bad_lookup, 1, 1),
            Err(FormatError::Truncated { .. })
        ));
        assert!(matches!(
            decode_gump(&[], 0, 1),
            Err(FormatError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_opaque_black() {
        let gump = Gump {
            width: 2,
            height: 1,
            pixels: vec![0x801F, 0x8000],
        };
        assert!(matches!(
            encode_gump(&gump),
            Err(EncodeError::UnrepresentablePixel { index: 1, value: 0x8000, .. })
        ));
    }

    /// Gumps over the full pixel range, at most one of them opaque black
    fn any_gump() -> impl Strategy<Value = Gump> {
        (1u16..32, 1u16..32).prop_flat_map(|(w, h)| {
            let count = usize::from(w) * usize::from(h);
            let pixel = prop_oneof![Just(0u16), any::<u16>().prop_filter("black", |&p| p != 0x8000)];
            (
                proptest::collection::vec(pixel, count),
                proptest::option::of(0..count),
            )
                .prop_map(move |(mut pixels, black)| {
                    if let Some(i) = black {
                        pixels[i] = 0x8000;
                    }
                    Gump {
                        width: w,
                        height: h,
                        pixels,
                    }
                })
        })
    }

    proptest! {
        #[test]
        fn prop_gump_round_trip_or_reject(gump in any_gump()) {
            match encode_gump(&gump) {
                Ok(raw) => {
                    prop_assert!(!gump.pixels.contains(&0x8000));
                    prop_assert_eq!(decode_gump(&raw, gump.width, gump.height).unwrap(), gump);
                }
                Err(EncodeError::UnrepresentablePixel { value, .. }) => {
                    prop_assert_eq!(value, 0x8000);
                    prop_assert!(gump.pixels.contains(&0x8000));
                }
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }
    }
}
