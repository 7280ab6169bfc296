//! Multi-structure component lists (`multi.mul`)
//!
//! A multi record is a flat array of component records in one of two
//! layouts:
//!
//! ```text
//! Classic (12 bytes)          Extended (16 bytes)
//! ├── item_id:  u16           ├── item_id:  u16
//! ├── offset_x: i16           ├── offset_x: i16
//! ├── offset_y: i16           ├── offset_y: i16
//! ├── offset_z: i16           ├── offset_z: i16
//! └── flags:    u32           └── flags:    u64
//! ```
//!
//! The layout is not recorded anywhere. Without a hint it is inferred from
//! the record length, which is ambiguous whenever the length is a multiple
//! of 48; such records need an explicit [`MultiFormat`].

pub mod text;

pub use text::{format_txt, format_uoa, format_wsc, parse_txt, parse_uoa, parse_wsc};

use crate::error::{EncodeError, EncodeResult, FormatError, Result};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use serde::{Deserialize, Serialize};

/// Component record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiFormat {
    /// 12-byte records with 32-bit flags
    #[default]
    Classic,
    /// 16-byte records with 64-bit flags
    Extended,
}

impl MultiFormat {
    /// Bytes per component record
    pub const fn record_size(self) -> usize {
        match self {
            Self::Classic => 12,
            Self::Extended => 16,
        }
    }

    /// Smallest layout able to hold every component's flags
    pub fn for_tiles(tiles: &[MultiTile]) -> Self {
        if tiles.iter().any(|t| t.flags > u64::from(u32::MAX)) {
            Self::Extended
        } else {
            Self::Classic
        }
    }
}

/// One component of a multi
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MultiTile {
    /// Static art id
    pub item_id: u16,
    /// X offset from the multi's center
    pub offset_x: i16,
    /// Y offset from the multi's center
    pub offset_y: i16,
    /// Z offset
    pub offset_z: i16,
    /// Tile flags, 32 significant bits in the classic layout
    pub flags: u64,
}

#[derive(BinRead, BinWrite)]
#[brw(little)]
struct ClassicRecord {
    item_id: u16,
    x: i16,
    y: i16,
    z: i16,
    flags: u32,
}

#[derive(BinRead, BinWrite)]
#[brw(little)]
struct ExtendedRecord {
    item_id: u16,
    x: i16,
    y: i16,
    z: i16,
    flags: u64,
}

fn detect_format(length: usize) -> Result<MultiFormat> {
    match (length % 12 == 0, length % 16 == 0) {
        (true, true) => Err(FormatError::AmbiguousLength { length }),
        (true, false) => Ok(MultiFormat::Classic),
        (false, true) => Ok(MultiFormat::Extended),
        (false, false) => Err(FormatError::UnexpectedLength {
            context: "multi record",
            length,
        }),
    }
}

/// Decode a multi record
///
/// With `format` set, the record length must be a multiple of that layout's
/// size. Without it, the layout is inferred and a length divisible by both
/// sizes fails with [`FormatError::AmbiguousLength`]. An empty record decodes
/// to no components in the classic layout.
pub fn decode_multi(raw: &[u8], format: Option<MultiFormat>) -> Result<(Vec<MultiTile>, MultiFormat)> {
    if raw.is_empty() {
        return Ok((Vec::new(), format.unwrap_or_default()));
    }

    let format = match format {
        Some(f) if raw.len() % f.record_size() == 0 => f,
        Some(_) => {
            return Err(FormatError::UnexpectedLength {
                context: "multi record",
                length: raw.len(),
            });
        }
        None => detect_format(raw.len())?,
    };

    let count = raw.len() / format.record_size();
    let mut cursor = Cursor::new(raw);
    let mut tiles = Vec::with_capacity(count);
    for _ in 0..count {
        let tile = match format {
            MultiFormat::Classic => {
                let r = ClassicRecord::read(&mut cursor)?;
                MultiTile {
                    item_id: r.item_id,
                    offset_x: r.x,
                    offset_y: r.y,
                    offset_z: r.z,
                    flags: u64::from(r.flags),
                }
            }
            MultiFormat::Extended => {
                let r = ExtendedRecord::read(&mut cursor)?;
                MultiTile {
                    item_id: r.item_id,
                    offset_x: r.x,
                    offset_y: r.y,
                    offset_z: r.z,
                    flags: r.flags,
                }
            }
        };
        tiles.push(tile);
    }

    Ok((tiles, format))
}

/// Encode components in the given layout
///
/// The classic layout rejects flags wider than 32 bits rather than
/// truncating them.
pub fn encode_multi(tiles: &[MultiTile], format: MultiFormat) -> EncodeResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(tiles.len() * format.record_size()));
    for t in tiles {
        match format {
            MultiFormat::Classic => {
                let flags = u32::try_from(t.flags).map_err(|_| EncodeError::OutOfRange {
                    context: "classic multi flags",
                    value: i64::try_from(t.flags).unwrap_or(i64::MAX),
                })?;
                ClassicRecord {
                    item_id: t.item_id,
                    x: t.offset_x,
                    y: t.offset_y,
                    z: t.offset_z,
                    flags,
                }
                .write(&mut cursor)?;
            }
            MultiFormat::Extended => ExtendedRecord {
                item_id: t.item_id,
                x: t.offset_x,
                y: t.offset_y,
                z: t.offset_z,
                flags: t.flags,
            }
            .write(&mut cursor)?,
        }
    }
    Ok(cursor.into_inner())
}

/// Shift components so their bounding box is centered on the origin
///
/// The center is `max - round((max - min) / 2)` per axis, with halves
/// rounded to even. Z offsets are untouched.
pub fn recenter(tiles: &mut [MultiTile]) {
    let Some(first) = tiles.first() else {
        return;
    };
    let init = (first.offset_x, first.offset_x, first.offset_y, first.offset_y);
    let (min_x, max_x, min_y, max_y) = tiles.iter().fold(init, |(lx, hx, ly, hy), t| {
        (
            lx.min(t.offset_x),
            hx.max(t.offset_x),
            ly.min(t.offset_y),
            hy.max(t.offset_y),
        )
    });

    let center = |min: i16, max: i16| -> i32 {
        let half = (f64::from(max) - f64::from(min)) / 2.0;
        i32::from(max) - half.round_ties_even() as i32
    };
    let (cx, cy) = (center(min_x, max_x), center(min_y, max_y));
    if cx == 0 && cy == 0 {
        return;
    }

    let shift = |v: i16, c: i32| -> i16 {
        (i32::from(v) - c).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    };
    for t in tiles {
        t.offset_x = shift(t.offset_x, cx);
        t.offset_y = shift(t.offset_y, cy);
    }
}
