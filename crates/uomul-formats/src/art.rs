//! Tile art: 44x44 land diamonds and RLE static items
//!
//! # Land tiles
//!
//! Land art is a 44x44 rhombus stored as raw pixels in scan order. The first
//! 22 rows grow from a 2-pixel span centred at x=21, the last 22 shrink back:
//!
//! ```text
//! row  0: x=21 run=2
//! row  1: x=20 run=4
//! ...
//! row 21: x=0  run=44
//! row 22: x=0  run=44
//! ...
//! row 43: x=21 run=2
//! ```
//!
//! Pixels outside the diamond decode as zero and are not stored.
//!
//! # Static items
//!
//! ```text
//! u16 × 2     unused header
//! u16 width
//! u16 height
//! u16 × height  row offsets, in words, relative to the end of this table
//! rows: (x_skip: u16, run: u16) followed by `run` pixels, until (0, 0)
//! ```
//!
//! Static pixels are stored with the alpha bit inverted.

use crate::bytes::words_le;
use crate::error::{EncodeError, EncodeResult, FormatError, Result};

/// Edge length of a land tile
pub const LAND_SIZE: usize = 44;

/// Pixels stored in a land tile record
pub const LAND_STORED_PIXELS: usize = 1012;

/// Spans `(row, x_start, run)` of the land diamond in storage order
pub fn diamond_spans() -> impl Iterator<Item = (usize, usize, usize)> {
    let half = LAND_SIZE / 2;
    (0..LAND_SIZE).map(move |y| {
        if y < half {
            (y, half - 1 - y, 2 * (y + 1))
        } else {
            let k = y - half;
            (y, k, LAND_SIZE - 2 * k)
        }
    })
}

/// Whether `(x, y)` lies inside the land diamond
pub fn in_diamond(x: usize, y: usize) -> bool {
    diamond_spans()
        .nth(y)
        .is_some_and(|(_, start, run)| x >= start && x < start + run)
}

/// Decoded land tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandTile {
    /// 44x44 row-major pixels, zero outside the diamond
    pub pixels: Vec<u16>,
}

impl LandTile {
    /// Pixel at `(x, y)`
    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= LAND_SIZE || y >= LAND_SIZE {
            return None;
        }
        self.pixels.get(y * LAND_SIZE + x).copied()
    }
}

/// Decode a land tile record
pub fn decode_land(raw: &[u8]) -> Result<LandTile> {
    let src = words_le(raw, "land tile")?;
    if src.len() < LAND_STORED_PIXELS {
        return Err(FormatError::Truncated {
            context: "land tile",
            needed: LAND_STORED_PIXELS * 2,
            available: raw.len(),
        });
    }

    let mut pixels = vec![0u16; LAND_SIZE * LAND_SIZE];
    let mut pos = 0;
    for (y, x_start, run) in diamond_spans() {
        let row = y * LAND_SIZE + x_start;
        for (dst, &value) in pixels[row..row + run].iter_mut().zip(&src[pos..pos + run]) {
            *dst = value | 0x8000;
        }
        pos += run;
    }

    Ok(LandTile { pixels })
}

/// Encode 44x44 land pixels; only the diamond interior is stored
///
/// Stored land pixels always decode opaque, so every pixel inside the
/// diamond must carry the alpha bit. Pixels outside it are ignored.
pub fn encode_land(pixels: &[u16]) -> EncodeResult<Vec<u8>> {
    if pixels.len() != LAND_SIZE * LAND_SIZE {
        return Err(EncodeError::PixelCountMismatch {
            expected: LAND_SIZE * LAND_SIZE,
            actual: pixels.len(),
        });
    }

    let mut out = Vec::with_capacity(LAND_STORED_PIXELS * 2);
    for (y, x_start, run) in diamond_spans() {
        let row = y * LAND_SIZE + x_start;
        for (i, &value) in pixels[row..row + run].iter().enumerate() {
            if value & 0x8000 == 0 {
                return Err(EncodeError::UnrepresentablePixel {
                    context: "land tile",
                    index: row + i,
                    value,
                });
            }
            out.extend_from_slice(&(value & 0x7FFF).to_le_bytes());
        }
    }
    Ok(out)
}

/// Decoded static item art
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticArt {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Row-major pixels, zero where transparent
    pub pixels: Vec<u16>,
}

impl StaticArt {
    /// Create static art, checking the buffer against the dimensions
    pub fn new(width: u16, height: u16, pixels: Vec<u16>) -> EncodeResult<Self> {
        let expected = usize::from(width) * usize::from(height);
        if pixels.len() != expected {
            return Err(EncodeError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Bounding box `(left, top, right, bottom)` of opaque pixels, inclusive
    pub fn opaque_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let width = usize::from(self.width);
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (i, &p) in self.pixels.iter().enumerate() {
            if p & 0x8000 == 0 {
                continue;
            }
            let (x, y) = (i % width, i / width);
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
            });
        }
        bounds
    }
}

/// Decode a static item record
pub fn decode_static(raw: &[u8]) -> Result<StaticArt> {
    let src = words_le(raw, "static art")?;
    if src.len() < 4 {
        return Err(FormatError::Truncated {
            context: "static art header",
            needed: 8,
            available: raw.len(),
        });
    }

    let width = src[2];
    let height = src[3];
    if width == 0 || height == 0 {
        return Err(FormatError::InvalidDimensions {
            width: i64::from(width),
            height: i64::from(height),
        });
    }
    let (w, h) = (usize::from(width), usize::from(height));

    let start = h + 4;
    if src.len() < start {
        return Err(FormatError::Truncated {
            context: "static art lookups",
            needed: start * 2,
            available: raw.len(),
        });
    }

    let truncated = |needed_words: usize| FormatError::Truncated {
        context: "static art row",
        needed: needed_words * 2,
        available: raw.len(),
    };

    let mut pixels = vec![0u16; w * h];
    for y in 0..h {
        let mut pos = start + usize::from(src[4 + y]);
        let mut x = 0usize;
        loop {
            if pos + 2 > src.len() {
                return Err(truncated(pos + 2));
            }
            let skip = usize::from(src[pos]);
            let run = usize::from(src[pos + 1]);
            pos += 2;
            if skip + run == 0 {
                break;
            }

            x += skip;
            if x + run > w {
                return Err(FormatError::RowOverrun {
                    row: y,
                    end: x + run,
                    width: w,
                });
            }
            if pos + run > src.len() {
                return Err(truncated(pos + run));
            }

            let row = y * w + x;
            for (dst, &value) in pixels[row..row + run].iter_mut().zip(&src[pos..pos + run]) {
                *dst = value ^ 0x8000;
            }
            pos += run;
            x += run;
        }
    }

    Ok(StaticArt {
        width,
        height,
        pixels,
    })
}

/// Encode static item art
///
/// Zero pixels are written as transparent skips. Any other pixel must carry
/// the alpha bit.
pub fn encode_static(art: &StaticArt) -> EncodeResult<Vec<u8>> {
    let (w, h) = (usize::from(art.width), usize::from(art.height));
    if w == 0 || h == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    if art.pixels.len() != w * h {
        return Err(EncodeError::PixelCountMismatch {
            expected: w * h,
            actual: art.pixels.len(),
        });
    }
    if let Some(index) = art
        .pixels
        .iter()
        .position(|&p| p != 0 && p & 0x8000 == 0)
    {
        return Err(EncodeError::UnrepresentablePixel {
            context: "static art",
            index,
            value: art.pixels[index],
        });
    }

    let mut lookups = Vec::with_capacity(h);
    let mut rle: Vec<u16> = Vec::new();

    for row in art.pixels.chunks_exact(w) {
        let offset = u16::try_from(rle.len()).map_err(|_| EncodeError::TooLarge {
            context: "static art row offset",
            size: rle.len(),
            limit: usize::from(u16::MAX),
        })?;
        lookups.push(offset);

        let mut cursor = 0usize;
        let mut x = 0usize;
        while x < w {
            if row[x] & 0x8000 == 0 {
                x += 1;
                continue;
            }
            let run_start = x;
            while x < w && row[x] & 0x8000 != 0 {
                x += 1;
            }
            rle.push((run_start - cursor) as u16);
            rle.push((x - run_start) as u16);
            rle.extend(row[run_start..x].iter().map(|&p| p ^ 0x8000));
            cursor = x;
        }
        rle.extend_from_slice(&[0, 0]);
    }

    let mut out = Vec::with_capacity((4 + h + rle.len()) * 2);
    for word in [0, 0, art.width, art.height]
        .into_iter()
        .chain(lookups)
        .chain(rle)
    {
        out.extend_from_slice(&word.to_le_bytes());
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_diamond_spans_cover_stored_pixels() {
        let total: usize = diamond_spans().map(|(_, _, run)| run).sum();
        assert_eq!(total, LAND_STORED_PIXELS);

        let spans: Vec<_> = diamond_spans().collect();
        assert_eq!(spans[0], (0, 21, 2));
        assert_eq!(spans[21], (21, 0, 44));
        assert_eq!(spans[22], (22, 0, 44));
        assert_eq!(spans[43], (43, 21, 2));
    }

    #[test]
    fn test_land_outside_diamond_is_transparent() {
        let raw: Vec<u8> = (0..LAND_STORED_PIXELS as u16)
            .flat_map(|i| (i & 0x7FFF).to_le_bytes())
            .collect();
        let tile = decode_land(&raw).unwrap();

        assert_eq!(tile.pixel(0, 0), Some(0));
        assert_eq!(tile.pixel(43, 43), Some(0));
        assert_eq!(tile.pixel(21, 0), Some(0x8000));
        assert_eq!(tile.pixel(22, 0), Some(0x8001));
        for y in 0..LAND_SIZE {
            for x in 0..LAND_SIZE {
                let p = tile.pixel(x, y).unwrap();
                assert_eq!(p != 0, in_diamond(x, y), "({x},{y})");
            }
        }

        assert_eq!(encode_land(&tile.pixels).unwrap(), raw);
    }

    #[test]
    fn test_land_rejects_short_and_odd_input() {
        assert!(matches!(
            decode_land(&[0u8; 2022]),
            Err(FormatError::Truncated { .. })
        ));
        assert!(matches!(
            decode_land(&[0u8; 2025]),
            Err(FormatError::Misaligned { .. })
        ));
        assert!(encode_land(&[0u16; 10]).is_err());
    }

    #[test]
    fn test_static_known_layout() {
        // 3x2: row 0 = [opaque red, transparent, opaque blue], row 1 empty
        let art = StaticArt::new(3, 2, vec![0xFC00, 0, 0x801F, 0, 0, 0]).unwrap();
        let raw = encode_static(&art).unwrap();

        let words: Vec<u16> = raw
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(
            words,
            vec![
                0, 0, 3, 2, // header
                0, 8, // row lookups
                0, 1, 0x7C00, 1, 1, 0x001F, 0, 0, // row 0
                0, 0, // row 1
            ]
        );
        assert_eq!(decode_static(&raw).unwrap(), art);
    }

    #[test]
    fn test_static_rejects_overrun_row() {
        // width 2, one row: skip 1, run 2
        let words: [u16; 10] = [0, 0, 2, 1, 0, 1, 2, 0x1111, 0x2222, 0];
        let raw: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert!(matches!(
            decode_static(&raw),
            Err(FormatError::RowOverrun { row: 0, end: 3, width: 2 })
        ));
    }

    #[test]
    fn test_static_rejects_bad_headers() {
        let zero_width: Vec<u8> = [0u16, 0, 0, 4].iter().flat_map(|w| w.to_le_bytes()).collect();
        assert!(matches!(
            decode_static(&zero_width),
            Err(FormatError::InvalidDimensions { .. })
        ));

        let short_lookups: Vec<u8> = [0u16, 0, 4, 4, 0].iter().flat_map(|w| w.to_le_bytes()).collect();
        assert!(matches!(
            decode_static(&short_lookups),
            Err(FormatError::Truncated { .. })
        ));

        // Run declares 3 pixels but only 1 follows
        let short_run: Vec<u8> = [0u16, 0, 4, 1, 0, 0, 3, 0x1234]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        assert!(matches!(
            decode_static(&short_run),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_opaque_bounds() {
        let art = StaticArt::new(3, 3, vec![0, 0, 0, 0, 0x8001, 0x8002, 0, 0, 0]).unwrap();
        assert_eq!(art.opaque_bounds(), Some((1, 1, 2, 1)));
    }

    #[test]
    fn test_encoders_reject_pixels_without_alpha() {
        let art = StaticArt::new(1, 1, vec![0x1234]).unwrap();
        assert!(matches!(
            encode_static(&art),
            Err(EncodeError::UnrepresentablePixel { index: 0, value: 0x1234, .. })
        ));

        let mut pixels = vec![0x8000u16; LAND_SIZE * LAND_SIZE];
        pixels[21] = 0x1234;
        assert!(matches!(
            encode_land(&pixels),
            Err(EncodeError::UnrepresentablePixel { index: 21, value: 0x1234, .. })
        ));

        // Outside the diamond anything goes
        pixels[21] = 0x8000;
        pixels[0] = 0x1234;
        let tile = decode_land(&encode_land(&pixels).unwrap()).unwrap();
        assert_eq!(tile.pixel(0, 0), Some(0));
        assert_eq!(tile.pixel(21, 0), Some(0x8000));
    }

    /// Static art with canonical pixels plus at most one arbitrary stray
    fn any_static() -> impl Strategy<Value = StaticArt> {
        (1u16..24, 1u16..24).prop_flat_map(|(w, h)| {
            let count = usize::from(w) * usize::from(h);
            let pixel = prop_oneof![Just(0u16), 0x8000u16..=0xFFFF];
            (
                proptest::collection::vec(pixel, count),
                proptest::option::of((0..count, any::<u16>())),
            )
                .prop_map(move |(mut pixels, stray)| {
                    if let Some((i, value)) = stray {
                        pixels[i] = value;
                    }
                    StaticArt {
                        width: w,
                        height: h,
                        pixels,
                    }
                })
        })
    }

    fn representable(p: u16) -> bool {
        p == 0 || p & 0x8000 != 0
    }

    proptest! {
        #[test]
        fn prop_static_round_trip_or_reject(art in any_static()) {
            let valid = art.pixels.iter().all(|&p| representable(p));
            match encode_static(&art) {
                Ok(raw) => {
                    prop_assert!(valid);
                    prop_assert_eq!(decode_static(&raw).unwrap(), art);
                }
                Err(EncodeError::UnrepresentablePixel { value, .. }) => {
                    prop_assert!(!valid);
                    prop_assert!(!representable(value));
                }
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }

        #[test]
        fn prop_land_round_trip_or_reject(
            values in proptest::collection::vec(0x8000u16..=0xFFFF, LAND_SIZE * LAND_SIZE),
            stray in proptest::option::of((0..LAND_SIZE * LAND_SIZE, 0u16..0x8000)),
        ) {
            let mut pixels = values;
            for y in 0..LAND_SIZE {
                for x in 0..LAND_SIZE {
                    if !in_diamond(x, y) {
                        pixels[y * LAND_SIZE + x] = 0;
                    }
                }
            }
            if let Some((i, value)) = stray {
                pixels[i] = value;
            }
            let expected: Vec<u16> = (0..LAND_SIZE * LAND_SIZE)
                .map(|i| if in_diamond(i % LAND_SIZE, i / LAND_SIZE) { pixels[i] } else { 0 })
                .collect();
            let valid = (0..LAND_SIZE * LAND_SIZE).all(|i| {
                !in_diamond(i % LAND_SIZE, i / LAND_SIZE) || pixels[i] & 0x8000 != 0
            });
            match encode_land(&pixels) {
                Ok(raw) => {
                    prop_assert!(valid);
                    prop_assert_eq!(decode_land(&raw).unwrap().pixels, expected);
                }
                Err(EncodeError::UnrepresentablePixel { value, .. }) => {
                    prop_assert!(!valid);
                    prop_assert_eq!(value & 0x8000, 0);
                }
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }
    }
}
