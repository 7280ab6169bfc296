//! Animation records (`anim.mul` and the `animN.mul` sets)
//!
//! ```text
//! palette:     u16 × 256 (alpha bit inverted)
//! frame_count: i32
//! lookups:     i32 × frame_count, relative to the end of the palette
//! frames:
//! ├── center_x: i16
//! ├── center_y: i16
//! ├── width:    u16
//! ├── height:   u16
//! └── runs until the 0x7FFF7FFF sentinel:
//!     ├── header: i32 ^ DOUBLE_XOR
//!     │   ├── bits 22-31  x offset
//!     │   ├── bits 12-21  y offset
//!     │   └── bits 0-11   run length
//!     └── u8 × run        palette indices
//! ```
//!
//! Offsets are biased by 0x200 so a run can start left of or above the
//! frame's origin.

use crate::bytes::{read_i16, read_i32, read_u16};
use crate::error::{EncodeError, EncodeResult, FormatError, Result};
use std::collections::HashMap;

/// Mask applied to every run header
pub const DOUBLE_XOR: u32 = (0x200 << 22) | (0x200 << 12);

/// Run header value that ends a frame
pub const FRAME_END: i32 = 0x7FFF_7FFF;

/// Largest frame count accepted in a record
pub const MAX_FRAMES: i32 = 4096;

const PALETTE_LEN: usize = 256;
const PALETTE_BYTES: usize = PALETTE_LEN * 2;

/// One decoded animation frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Horizontal anchor, mirrored when the frame was decoded flipped
    pub center_x: i32,
    /// Vertical anchor
    pub center_y: i32,
    /// Row-major pixels, zero where transparent
    pub pixels: Vec<u16>,
}

impl AnimationFrame {
    /// Whether the frame has no drawable area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Decode every frame of an animation record
///
/// `flip` mirrors frames horizontally, used for the directions that the
/// client renders from the opposite side's artwork.
pub fn decode_animation(data: &[u8], flip: bool) -> Result<Vec<AnimationFrame>> {
    if data.len() < PALETTE_BYTES + 4 {
        return Err(FormatError::Truncated {
            context: "animation header",
            needed: PALETTE_BYTES + 4,
            available: data.len(),
        });
    }

    let palette: Vec<u16> = data[..PALETTE_BYTES]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]) ^ 0x8000)
        .collect();

    let start = PALETTE_BYTES;
    let frame_count = read_i32(data, start, "animation frame count")?;
    if !(0..=MAX_FRAMES).contains(&frame_count) {
        return Err(FormatError::InvalidCount {
            context: "animation frames",
            count: i64::from(frame_count),
        });
    }

    let mut frames = Vec::with_capacity(frame_count as usize);
    for i in 0..frame_count as usize {
        let rel = read_i32(data, start + 4 + i * 4, "animation lookups")?;
        let offset = start as i64 + i64::from(rel);
        if offset < 0 || offset >= data.len() as i64 {
            return Err(FormatError::InvalidLookup {
                index: i,
                offset,
                length: data.len(),
            });
        }
        frames.push(decode_frame(data, offset as usize, &palette, flip)?);
    }

    Ok(frames)
}

fn decode_frame(data: &[u8], mut off: usize, palette: &[u16], flip: bool) -> Result<AnimationFrame> {
    let center_x = i32::from(read_i16(data, off, "animation frame header")?);
    let center_y = i32::from(read_i16(data, off + 2, "animation frame header")?);
    let width = read_u16(data, off + 4, "animation frame header")?;
    let height = read_u16(data, off + 6, "animation frame header")?;
    off += 8;

    if width == 0 || height == 0 {
        return Ok(AnimationFrame {
            width: 0,
            height: 0,
            center_x,
            center_y,
            pixels: Vec::new(),
        });
    }

    let (w, h) = (i64::from(width), i64::from(height));
    let mut pixels = vec![0u16; (w * h) as usize];

    let x_base = i64::from(center_x) - 0x200;
    let y_base = i64::from(center_y) + h - 0x200;
    let base_x = if flip { (w - 1) - x_base } else { x_base };

    loop {
        let header_raw = read_i32(data, off, "animation run header")?;
        off += 4;
        if header_raw == FRAME_END {
            break;
        }

        let header = (header_raw as u32) ^ DOUBLE_XOR;
        let x_off = i64::from((header >> 22) & 0x3FF);
        let y_off = i64::from((header >> 12) & 0x3FF);
        let run = (header & 0xFFF) as usize;
        if run == 0 {
            continue;
        }

        if off + run > data.len() {
            return Err(FormatError::Truncated {
                context: "animation run pixels",
                needed: off + run,
                available: data.len(),
            });
        }
        let indices = &data[off..off + run];
        off += run;

        let dst_y = y_base + y_off;
        if !(0..h).contains(&dst_y) {
            continue;
        }

        let (start_x, step) = if flip {
            (base_x - x_off, -1)
        } else {
            (base_x + x_off, 1)
        };
        let row = dst_y * w;
        for (i, &pal) in indices.iter().enumerate() {
            let dst_x = start_x + step * i as i64;
            if (0..w).contains(&dst_x) {
                pixels[(row + dst_x) as usize] = palette[usize::from(pal)];
            }
        }
    }

    Ok(AnimationFrame {
        width,
        height,
        center_x: if flip { i32::from(width) - center_x } else { center_x },
        center_y,
        pixels,
    })
}

/// Encode frames into an animation record (unflipped orientation)
///
/// Nonzero pixels are collected into the palette; more than 256 distinct
/// colors is an error. Runs are split at 4095 pixels.
pub fn encode_animation(frames: &[AnimationFrame]) -> EncodeResult<Vec<u8>> {
    if frames.len() > MAX_FRAMES as usize {
        return Err(EncodeError::InvalidCount {
            context: "animation frames",
            expected: MAX_FRAMES as usize,
            actual: frames.len(),
        });
    }

    let mut palette: Vec<u16> = Vec::new();
    let mut slots: HashMap<u16, u8> = HashMap::new();
    for frame in frames {
        let expected = usize::from(frame.width) * usize::from(frame.height);
        if frame.pixels.len() != expected {
            return Err(EncodeError::PixelCountMismatch {
                expected,
                actual: frame.pixels.len(),
            });
        }
        for &p in frame.pixels.iter().filter(|&&p| p != 0) {
            if !slots.contains_key(&p) {
                if palette.len() == PALETTE_LEN {
                    return Err(EncodeError::TooManyColors(palette.len() + 1));
                }
                slots.insert(p, palette.len() as u8);
                palette.push(p);
            }
        }
    }

    let mut bodies = Vec::with_capacity(frames.len());
    for frame in frames {
        bodies.push(encode_frame(frame, &slots)?);
    }

    let mut out = Vec::new();
    for i in 0..PALETTE_LEN {
        let color = palette.get(i).copied().unwrap_or(0);
        out.extend_from_slice(&(color ^ 0x8000).to_le_bytes());
    }
    out.extend_from_slice(&(frames.len() as i32).to_le_bytes());

    let mut rel = 4 + 4 * frames.len();
    for body in &bodies {
        let value = i32::try_from(rel).map_err(|_| EncodeError::TooLarge {
            context: "animation frame offset",
            size: rel,
            limit: i32::MAX as usize,
        })?;
        out.extend_from_slice(&value.to_le_bytes());
        rel += body.len();
    }
    for body in bodies {
        out.extend(body);
    }
    Ok(out)
}

fn encode_frame(frame: &AnimationFrame, slots: &HashMap<u16, u8>) -> EncodeResult<Vec<u8>> {
    let center_x = i16::try_from(frame.center_x).map_err(|_| EncodeError::OutOfRange {
        context: "animation center_x",
        value: i64::from(frame.center_x),
    })?;
    let center_y = i16::try_from(frame.center_y).map_err(|_| EncodeError::OutOfRange {
        context: "animation center_y",
        value: i64::from(frame.center_y),
    })?;

    let mut out = Vec::new();
    out.extend_from_slice(&center_x.to_le_bytes());
    out.extend_from_slice(&center_y.to_le_bytes());
    out.extend_from_slice(&frame.width.to_le_bytes());
    out.extend_from_slice(&frame.height.to_le_bytes());

    let (w, h) = (usize::from(frame.width), usize::from(frame.height));
    if w > 0 && h > 0 {
        let x_base = i64::from(frame.center_x) - 0x200;
        let y_base = i64::from(frame.center_y) + h as i64 - 0x200;

        for (y, row) in frame.pixels.chunks_exact(w).enumerate() {
            let mut x = 0usize;
            while x < w {
                if row[x] == 0 {
                    x += 1;
                    continue;
                }
                let run_start = x;
                while x < w && row[x] != 0 && x - run_start < 0xFFF {
                    x += 1;
                }
                let x_off = run_start as i64 - x_base;
                let y_off = y as i64 - y_base;
                let header = run_header(x_off, y_off, x - run_start)?;
                out.extend_from_slice(&header.to_le_bytes());
                // Every nonzero color was registered in the palette pass
                out.extend(row[run_start..x].iter().map(|p| slots.get(p).copied().unwrap_or(0)));
            }
        }
    }

    out.extend_from_slice(&FRAME_END.to_le_bytes());
    Ok(out)
}

fn run_header(x_off: i64, y_off: i64, run: usize) -> EncodeResult<i32> {
    for (context, value) in [("animation run x", x_off), ("animation run y", y_off)] {
        if !(0..=0x3FF).contains(&value) {
            return Err(EncodeError::OutOfRange { context, value });
        }
    }
    let header = ((x_off as u32) << 22) | ((y_off as u32) << 12) | run as u32;
    let raw = (header ^ DOUBLE_XOR) as i32;
    if raw == FRAME_END {
        return Err(EncodeError::OutOfRange {
            context: "animation run header",
            value: i64::from(raw),
        });
    }
    Ok(raw)
}
