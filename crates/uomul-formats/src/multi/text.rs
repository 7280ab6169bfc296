//! Text interchange formats for multi components
//!
//! Three formats are understood, all line oriented:
//!
//! - **TXT**: one component per line, `0x<item hex> <x> <y> <z> <flags>`.
//!   Blank lines and lines starting with `#` are ignored.
//! - **UOA**: four header lines, the fourth starting with the component
//!   count, then `<item> <x> <y> <z> <flags>` per component in decimal.
//! - **WSC**: `SECTION WORLDITEM <n>` blocks holding `ID`, `X`, `Y` and `Z`
//!   keys. Other keys are ignored and every component gets the background
//!   flag.
//!
//! Parsers skip malformed lines instead of failing, and every parser
//! recenters the result with [`recenter`].

use super::{MultiTile, recenter};
use std::fmt::Write as _;

const BACKGROUND_FLAG: u64 = 0x1;

fn parse_fields(parts: &[&str], item_radix: u32) -> Option<MultiTile> {
    let [item, x, y, z, flags, ..] = parts else {
        return None;
    };
    let item = if item_radix == 16 {
        let lower = item.to_ascii_lowercase();
        u16::from_str_radix(lower.trim_start_matches("0x"), 16).ok()?
    } else {
        item.parse().ok()?
    };
    Some(MultiTile {
        item_id: item,
        offset_x: x.parse().ok()?,
        offset_y: y.parse().ok()?,
        offset_z: z.parse().ok()?,
        flags: flags.parse().ok()?,
    })
}

/// Parse the TXT format
pub fn parse_txt(text: &str) -> Vec<MultiTile> {
    let mut tiles: Vec<MultiTile> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| parse_fields(&line.split_whitespace().collect::<Vec<_>>(), 16))
        .collect();
    recenter(&mut tiles);
    tiles
}

/// Format components as TXT
pub fn format_txt(tiles: &[MultiTile]) -> String {
    let mut out = String::new();
    for t in tiles {
        let _ = writeln!(
            out,
            "0x{:X} {} {} {} {}",
            t.item_id, t.offset_x, t.offset_y, t.offset_z, t.flags
        );
    }
    out
}

/// Parse the UOA format
///
/// Input with fewer than four lines or an unreadable count yields nothing.
pub fn parse_uoa(text: &str) -> Vec<MultiTile> {
    let lines: Vec<&str> = text.lines().collect();
    let Some(count) = lines
        .get(3)
        .and_then(|l| l.split_whitespace().next())
        .and_then(|c| c.parse::<usize>().ok())
    else {
        return Vec::new();
    };

    let mut tiles: Vec<MultiTile> = lines
        .iter()
        .skip(4)
        .take(count)
        .filter_map(|line| parse_fields(&line.split_whitespace().collect::<Vec<_>>(), 10))
        .collect();
    recenter(&mut tiles);
    tiles
}

/// Format components as UOA
pub fn format_uoa(tiles: &[MultiTile]) -> String {
    let mut out = format!(
        "6 version\n1 template id\n-1 item version\n{} num components\n",
        tiles.len()
    );
    for t in tiles {
        let _ = writeln!(
            out,
            "{} {} {} {} {}",
            t.item_id, t.offset_x, t.offset_y, t.offset_z, t.flags
        );
    }
    out
}

#[derive(Default)]
struct WorldItem {
    id: Option<i64>,
    x: i16,
    y: i16,
    z: i16,
}

impl WorldItem {
    fn finish(self) -> Option<MultiTile> {
        let id = self.id?;
        Some(MultiTile {
            item_id: (id & 0xFFFF) as u16,
            offset_x: self.x,
            offset_y: self.y,
            offset_z: self.z,
            flags: BACKGROUND_FLAG,
        })
    }
}

/// Parse the WSC format
pub fn parse_wsc(text: &str) -> Vec<MultiTile> {
    let mut tiles = Vec::new();
    let mut current = WorldItem::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("SECTION WORLDITEM") {
            tiles.extend(std::mem::take(&mut current).finish());
        } else if let Some(v) = line.strip_prefix("ID") {
            if let Ok(v) = v.trim().parse() {
                current.id = Some(v);
            }
        } else if let Some(v) = line.strip_prefix('X') {
            current.x = v.trim().parse().unwrap_or(current.x);
        } else if let Some(v) = line.strip_prefix('Y') {
            current.y = v.trim().parse().unwrap_or(current.y);
        } else if let Some(v) = line.strip_prefix('Z') {
            current.z = v.trim().parse().unwrap_or(current.z);
        }
    }
    tiles.extend(current.finish());

    recenter(&mut tiles);
    tiles
}

/// Format components as WSC world items
pub fn format_wsc(tiles: &[MultiTile]) -> String {
    let mut out = String::new();
    for (i, t) in tiles.iter().enumerate() {
        let _ = write!(
            out,
            "SECTION WORLDITEM {i}\n{{\n\tID\t{}\n\tX\t{}\n\tY\t{}\n\tZ\t{}\n\tColor\t0\n}}\n",
            t.item_id, t.offset_x, t.offset_y, t.offset_z
        );
    }
    out
}
