//! Tile properties (`tiledata.mul`)
//!
//! ```text
//! Land section: 512 groups
//! ├── header: i32
//! └── LandTileData × 32
//!     ├── flags:  u32
//!     ├── unk1:   i32          (new layout only)
//!     ├── tex_id: i16
//!     └── name:   20 bytes
//!
//! Item section: K groups
//! ├── header: i32
//! └── ItemTileData × 32
//!     ├── flags:           u32
//!     ├── unk1:            i32 (new layout only)
//!     ├── weight:          u8
//!     ├── quality:         u8
//!     ├── misc_data:       i16
//!     ├── unk2:            u8
//!     ├── quantity:        u8
//!     ├── animation:       i16
//!     ├── unk3:            u8
//!     ├── hue:             u8
//!     ├── stacking_offset: u8
//!     ├── value:           u8
//!     ├── height:          u8
//!     └── name:            20 bytes
//! ```
//!
//! The layout is detected from the file size: after the land section, the
//! remainder must be a whole number of item groups. The old layout is tried
//! first.

use crate::MulFormat;
use crate::bytes::{latin1_fixed, latin1_field};
use crate::error::{EncodeError, EncodeResult, FormatError, Result};
use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};
use std::fmt::Write as _;

/// Number of land tiles
pub const LAND_TILE_COUNT: usize = 0x4000;

const GROUP_SIZE: usize = 32;
const NAME_BYTES: usize = 20;

/// Bit masks of the tile flag field
pub struct TileFlag;

#[allow(missing_docs)]
impl TileFlag {
    pub const BACKGROUND: u32 = 0x0000_0001;
    pub const WEAPON: u32 = 0x0000_0002;
    pub const TRANSPARENT: u32 = 0x0000_0004;
    pub const TRANSLUCENT: u32 = 0x0000_0008;
    pub const WALL: u32 = 0x0000_0010;
    pub const DAMAGING: u32 = 0x0000_0020;
    pub const IMPASSABLE: u32 = 0x0000_0040;
    pub const WET: u32 = 0x0000_0080;
    pub const UNKNOWN1: u32 = 0x0000_0100;
    pub const SURFACE: u32 = 0x0000_0200;
    pub const BRIDGE: u32 = 0x0000_0400;
    pub const GENERIC: u32 = 0x0000_0800;
    pub const WINDOW: u32 = 0x0000_1000;
    pub const NO_SHOOT: u32 = 0x0000_2000;
    pub const ARTICLE_A: u32 = 0x0000_4000;
    pub const ARTICLE_AN: u32 = 0x0000_8000;
    pub const INTERNAL: u32 = 0x0001_0000;
    pub const FOLIAGE: u32 = 0x0002_0000;
    pub const PARTIAL_HUE: u32 = 0x0004_0000;
    pub const UNKNOWN2: u32 = 0x0008_0000;
    pub const MAP: u32 = 0x0010_0000;
    pub const CONTAINER: u32 = 0x0020_0000;
    pub const WEARABLE: u32 = 0x0040_0000;
    pub const LIGHT_SOURCE: u32 = 0x0080_0000;
    pub const ANIMATION: u32 = 0x0100_0000;
    pub const HOVER_OVER: u32 = 0x0200_0000;
    pub const UNKNOWN3: u32 = 0x0400_0000;
    pub const ARMOR: u32 = 0x0800_0000;
    pub const ROOF: u32 = 0x1000_0000;
    pub const DOOR: u32 = 0x2000_0000;
    pub const STAIR_BACK: u32 = 0x4000_0000;
    pub const STAIR_RIGHT: u32 = 0x8000_0000;
}

const FLAG_COLUMNS: &str = "Background;Weapon;Transparent;Translucent;Wall;Damage;Impassible;Wet;Unknow1;\
Surface;Bridge;Generic;Window;NoShoot;PrefixA;PrefixAn;Internal;Foliage;PartialHue;\
Unknow2;Map;Container/Height;Wearable;Lightsource;Animation;HoverOver;\
Unknow3;Armor;Roof;Door;StairBack;StairRight";

/// Properties of a land tile
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LandTileData {
    /// [`TileFlag`] bits
    pub flags: u32,
    /// Extra field of the new layout, 0 in the old one
    pub unk1: i32,
    /// Texture id drawn for stretched land
    pub tex_id: i16,
    /// Display name
    pub name: String,
}

/// Properties of an item tile
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemTileData {
    /// [`TileFlag`] bits
    pub flags: u32,
    /// Extra field of the new layout, 0 in the old one
    pub unk1: i32,
    pub weight: u8,
    pub quality: u8,
    pub misc_data: i16,
    pub unk2: u8,
    pub quantity: u8,
    /// Animation body or gump id
    pub animation: i16,
    pub unk3: u8,
    pub hue: u8,
    pub stacking_offset: u8,
    pub value: u8,
    pub height: u8,
    /// Display name
    pub name: String,
}

#[derive(BinRead, BinWrite)]
#[brw(little)]
struct RawLandTail {
    tex_id: i16,
    name: [u8; NAME_BYTES],
}

#[derive(BinRead, BinWrite)]
#[brw(little)]
struct RawItemTail {
    weight: u8,
    quality: u8,
    misc_data: i16,
    unk2: u8,
    quantity: u8,
    animation: i16,
    unk3: u8,
    hue: u8,
    stacking_offset: u8,
    value: u8,
    height: u8,
    name: [u8; NAME_BYTES],
}

const fn land_record_size(new_format: bool) -> usize {
    if new_format { 30 } else { 26 }
}

const fn item_record_size(new_format: bool) -> usize {
    if new_format { 41 } else { 37 }
}

const fn land_section_size(new_format: bool) -> usize {
    4 * (LAND_TILE_COUNT / GROUP_SIZE) + LAND_TILE_COUNT * land_record_size(new_format)
}

const fn item_group_size(new_format: bool) -> usize {
    4 + GROUP_SIZE * item_record_size(new_format)
}

/// Detect the layout from the file size, `None` when neither fits
pub fn detect_layout(length: usize) -> Option<bool> {
    [false, true].into_iter().find(|&new_format| {
        length
            .checked_sub(land_section_size(new_format))
            .is_some_and(|rest| rest % item_group_size(new_format) == 0)
    })
}

/// Decoded `tiledata.mul`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileData {
    /// Land tiles, always 0x4000
    pub land: Vec<LandTileData>,
    /// Item tiles, a multiple of 32
    pub items: Vec<ItemTileData>,
    /// Group headers of the land section
    pub land_headers: Vec<i32>,
    /// Group headers of the item section
    pub item_headers: Vec<i32>,
    /// Whether records carry the extra `unk1` field
    pub is_new_format: bool,
}

impl TileData {
    /// Land tile for an id, masked to 14 bits
    pub fn land_tile(&self, id: u32) -> Option<&LandTileData> {
        self.land.get((id & 0x3FFF) as usize)
    }

    /// Item tile for an id, masked to 16 bits
    pub fn item_tile(&self, id: u32) -> Option<&ItemTileData> {
        self.items.get((id & 0xFFFF) as usize)
    }

    /// Mutable land tile for an id
    pub fn land_tile_mut(&mut self, id: u32) -> Option<&mut LandTileData> {
        self.land.get_mut((id & 0x3FFF) as usize)
    }

    /// Mutable item tile for an id
    pub fn item_tile_mut(&mut self, id: u32) -> Option<&mut ItemTileData> {
        self.items.get_mut((id & 0xFFFF) as usize)
    }

    /// Export land tiles as semicolon separated values
    pub fn land_csv(&self) -> String {
        let mut out = format!("ID;Name;TextureID;HSAUnk1;{FLAG_COLUMNS}\n");
        for (i, t) in self.land.iter().enumerate() {
            let _ = write!(out, "0x{i:04X};{};0x{:04X};{}", t.name, t.tex_id as u16, t.unk1);
            push_flag_columns(&mut out, t.flags);
        }
        out
    }

    /// Export item tiles as semicolon separated values
    pub fn item_csv(&self) -> String {
        let mut out = format!(
            "ID;Name;Weight/Quantity;Layer/Quality;Gump/AnimID;Height;Hue;Class/Quantity;\
             StackingOffset;MiscData;Unknown1;Unknown2;Unknown3;{FLAG_COLUMNS}\n"
        );
        for (i, t) in self.items.iter().enumerate() {
            let _ = write!(
                out,
                "0x{i:04X};{};{};{};0x{:04X};{};{};{};{};{};{};{};{}",
                t.name,
                t.weight,
                t.quality,
                t.animation as u16,
                t.height,
                t.hue,
                t.quantity,
                t.stacking_offset,
                t.misc_data,
                t.unk1,
                t.unk2,
                t.unk3
            );
            push_flag_columns(&mut out, t.flags);
        }
        out
    }

    /// Apply land rows exported by [`TileData::land_csv`], returning how many
    /// rows were applied
    pub fn apply_land_csv(&mut self, text: &str) -> usize {
        let new_format = self.is_new_format;
        let mut applied = 0;
        for parts in csv_rows(text, 4 + 32) {
            let Some(id) = csv_number(parts[0]) else { continue };
            let Some(tile) = self.land_tile_mut(id as u32) else { continue };
            tile.name = parts[1].to_string();
            tile.tex_id = csv_number(parts[2]).unwrap_or(0) as u16 as i16;
            if new_format {
                tile.unk1 = csv_number(parts[3]).unwrap_or(0) as i32;
            }
            tile.flags = flags_from_columns(&parts[4..]);
            applied += 1;
        }
        applied
    }

    /// Apply item rows exported by [`TileData::item_csv`], returning how many
    /// rows were applied
    pub fn apply_item_csv(&mut self, text: &str) -> usize {
        let new_format = self.is_new_format;
        let mut applied = 0;
        for parts in csv_rows(text, 13 + 32) {
            let Some(id) = csv_number(parts[0]) else { continue };
            let Some(tile) = self.item_tile_mut(id as u32) else { continue };
            let num = |i: usize| csv_number(parts[i]).unwrap_or(0);
            tile.name = parts[1].to_string();
            tile.weight = num(2) as u8;
            tile.quality = num(3) as u8;
            tile.animation = num(4) as u16 as i16;
            tile.height = num(5) as u8;
            tile.hue = num(6) as u8;
            tile.quantity = num(7) as u8;
            tile.stacking_offset = num(8) as u8;
            tile.misc_data = num(9) as i16;
            if new_format {
                tile.unk1 = num(10) as i32;
            }
            tile.unk2 = num(11) as u8;
            tile.unk3 = num(12) as u8;
            tile.flags = flags_from_columns(&parts[13..]);
            applied += 1;
        }
        applied
    }
}

fn push_flag_columns(out: &mut String, flags: u32) {
    for bit in 0..32 {
        out.push(';');
        out.push(if flags & (1 << bit) != 0 { '1' } else { '0' });
    }
    out.push('\n');
}

fn flags_from_columns(columns: &[&str]) -> u32 {
    columns
        .iter()
        .take(32)
        .enumerate()
        .filter(|(_, c)| c.trim().parse::<i64>().is_ok_and(|v| v != 0))
        .fold(0, |acc, (bit, _)| acc | (1 << bit))
}

fn csv_rows(text: &str, min_columns: usize) -> impl Iterator<Item = Vec<&str>> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("ID;"))
        .map(|l| l.split(';').collect::<Vec<_>>())
        .filter(move |parts| parts.len() >= min_columns)
}

fn csv_number(field: &str) -> Option<i64> {
    let field = field.trim();
    if field.is_empty() {
        return Some(0);
    }
    let lower = field.to_ascii_lowercase();
    match lower.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => field.parse().ok(),
    }
}

impl MulFormat for TileData {
    fn parse(data: &[u8]) -> Result<Self> {
        let is_new_format = detect_layout(data.len()).ok_or(FormatError::UnexpectedLength {
            context: "tiledata",
            length: data.len(),
        })?;
        let mut cursor = Cursor::new(data);

        let mut land_headers = Vec::with_capacity(LAND_TILE_COUNT / GROUP_SIZE);
        let mut land = Vec::with_capacity(LAND_TILE_COUNT);
        for _ in 0..LAND_TILE_COUNT / GROUP_SIZE {
            land_headers.push(cursor.read_le::<i32>()?);
            for _ in 0..GROUP_SIZE {
                let flags = cursor.read_le::<u32>()?;
                let unk1 = if is_new_format { cursor.read_le::<i32>()? } else { 0 };
                let tail = RawLandTail::read(&mut cursor)?;
                land.push(LandTileData {
                    flags,
                    unk1,
                    tex_id: tail.tex_id,
                    name: latin1_field(&tail.name),
                });
            }
        }

        let groups = (data.len() - land_section_size(is_new_format)) / item_group_size(is_new_format);
        let mut item_headers = Vec::with_capacity(groups);
        let mut items = Vec::with_capacity(groups * GROUP_SIZE);
        for _ in 0..groups {
            item_headers.push(cursor.read_le::<i32>()?);
            for _ in 0..GROUP_SIZE {
                let flags = cursor.read_le::<u32>()?;
                let unk1 = if is_new_format { cursor.read_le::<i32>()? } else { 0 };
                let t = RawItemTail::read(&mut cursor)?;
                items.push(ItemTileData {
                    flags,
                    unk1,
                    weight: t.weight,
                    quality: t.quality,
                    misc_data: t.misc_data,
                    unk2: t.unk2,
                    quantity: t.quantity,
                    animation: t.animation,
                    unk3: t.unk3,
                    hue: t.hue,
                    stacking_offset: t.stacking_offset,
                    value: t.value,
                    height: t.height,
                    name: latin1_field(&t.name),
                });
            }
        }

        Ok(Self {
            land,
            items,
            land_headers,
            item_headers,
            is_new_format,
        })
    }

    /// Re-serialize in the detected layout; missing group headers are written as 0
    fn build(&self) -> EncodeResult<Vec<u8>> {
        if self.land.len() != LAND_TILE_COUNT {
            return Err(EncodeError::InvalidCount {
                context: "tiledata land tiles",
                expected: LAND_TILE_COUNT,
                actual: self.land.len(),
            });
        }
        if self.items.len() % GROUP_SIZE != 0 {
            return Err(EncodeError::InvalidCount {
                context: "tiledata item tiles",
                expected: self.items.len().next_multiple_of(GROUP_SIZE),
                actual: self.items.len(),
            });
        }

        let new_format = self.is_new_format;
        let groups = self.items.len() / GROUP_SIZE;
        let mut cursor = Cursor::new(Vec::with_capacity(
            land_section_size(new_format) + groups * item_group_size(new_format),
        ));

        for (g, group) in self.land.chunks(GROUP_SIZE).enumerate() {
            cursor.write_le(&self.land_headers.get(g).copied().unwrap_or(0))?;
            for t in group {
                cursor.write_le(&t.flags)?;
                if new_format {
                    cursor.write_le(&t.unk1)?;
                }
                RawLandTail {
                    tex_id: t.tex_id,
                    name: latin1_fixed(&t.name),
                }
                .write(&mut cursor)?;
            }
        }

        for (g, group) in self.items.chunks(GROUP_SIZE).enumerate() {
            cursor.write_le(&self.item_headers.get(g).copied().unwrap_or(0))?;
            for t in group {
                cursor.write_le(&t.flags)?;
                if new_format {
                    cursor.write_le(&t.unk1)?;
                }
                RawItemTail {
                    weight: t.weight,
                    quality: t.quality,
                    misc_data: t.misc_data,
                    unk2: t.unk2,
                    quantity: t.quantity,
                    animation: t.animation,
                    unk3: t.unk3,
                    hue: t.hue,
                    stacking_offset: t.stacking_offset,
                    value: t.value,
                    height: t.height,
                    name: latin1_fixed(&t.name),
                }
                .write(&mut cursor)?;
            }
        }

        Ok(cursor.into_inner())
    }
}
