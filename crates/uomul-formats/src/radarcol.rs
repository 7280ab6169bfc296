//! Radar colors (`radarcol.mul`)
//!
//! A flat array of little-endian `i16` colors: land tiles from `0x0000`,
//! items from `0x4000`. A missing or empty file stands for `0x8000` zero
//! entries.

use crate::MulFormat;
use crate::bytes::words_le;
use crate::error::{EncodeResult, Result};
use std::fmt::Write as _;

/// Entry count used when no colors are present
pub const DEFAULT_RADAR_ENTRIES: usize = 0x8000;

const ITEM_BASE: usize = 0x4000;

/// Radar color table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarColors {
    colors: Vec<i16>,
}

impl Default for RadarColors {
    fn default() -> Self {
        Self {
            colors: vec![0; DEFAULT_RADAR_ENTRIES],
        }
    }
}

impl RadarColors {
    /// All entries
    pub fn colors(&self) -> &[i16] {
        &self.colors
    }

    fn land_slot(id: u32) -> usize {
        (id & 0x3FFF) as usize
    }

    fn item_slot(id: u32) -> usize {
        (id & 0x3FFF) as usize + ITEM_BASE
    }

    /// Color of a land tile, 0 when past the table
    pub fn land_color(&self, id: u32) -> i16 {
        self.colors.get(Self::land_slot(id)).copied().unwrap_or(0)
    }

    /// Color of an item, 0 when past the table
    pub fn item_color(&self, id: u32) -> i16 {
        self.colors.get(Self::item_slot(id)).copied().unwrap_or(0)
    }

    /// Set a land tile's color; ignored past the table
    pub fn set_land_color(&mut self, id: u32, value: i16) {
        if let Some(slot) = self.colors.get_mut(Self::land_slot(id)) {
            *slot = value;
        }
    }

    /// Set an item's color; ignored past the table
    pub fn set_item_color(&mut self, id: u32, value: i16) {
        if let Some(slot) = self.colors.get_mut(Self::item_slot(id)) {
            *slot = value;
        }
    }

    /// Export as `ID;Color` CSV
    pub fn to_csv(&self) -> String {
        let mut out = String::from("ID;Color\n");
        for (i, v) in self.colors.iter().enumerate() {
            let _ = writeln!(out, "0x{i:04X};{v}");
        }
        out
    }

    /// Apply `ID;Color` CSV lines in place, returning how many were applied
    ///
    /// Either column may be decimal or `0x` hex. Unparseable lines and
    /// indices past the table are skipped; the table is never resized.
    pub fn apply_csv(&mut self, text: &str) -> usize {
        fn number(field: &str) -> Option<i64> {
            let field = field.trim();
            let lower = field.to_ascii_lowercase();
            match lower.strip_prefix("0x") {
                Some(hex) => i64::from_str_radix(hex, 16).ok(),
                None => field.parse().ok(),
            }
        }

        let mut applied = 0;
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with("ID;") {
                continue;
            }
            let mut parts = line.split(';');
            let (Some(idx), Some(val)) = (parts.next().and_then(number), parts.next().and_then(number))
            else {
                continue;
            };
            let (Ok(idx), Ok(val)) = (usize::try_from(idx), i16::try_from(val)) else {
                continue;
            };
            if let Some(slot) = self.colors.get_mut(idx) {
                *slot = val;
                applied += 1;
            }
        }
        applied
    }
}

impl MulFormat for RadarColors {
    fn parse(data: &[u8]) -> Result<Self> {
        let words = words_le(data, "radarcol")?;
        if words.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            colors: words.into_iter().map(|w| w as i16).collect(),
        })
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        Ok(self.colors.iter().flat_map(|c| c.to_le_bytes()).collect())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FormatError;
    use crate::test_utils::test_round_trip;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_and_odd_input() {
        assert_eq!(RadarColors::parse(&[]).unwrap().colors().len(), DEFAULT_RADAR_ENTRIES);
        assert!(matches!(
            RadarColors::parse(&[1, 2, 3]),
            Err(FormatError::Misaligned { length: 3, .. })
        ));
    }

    #[test]
    fn test_land_and_item_slots() {
        let mut colors = RadarColors::default();
        colors.set_land_color(0x4001, 77);
        colors.set_item_color(2, -5);
        assert_eq!(colors.land_color(1), 77);
        assert_eq!(colors.colors()[0x4002], -5);
        assert_eq!(colors.item_color(0x4002), -5);

        let short = RadarColors::parse(&[1, 0, 2, 0]).unwrap();
        assert_eq!(short.land_color(1), 2);
        assert_eq!(short.item_color(0), 0);
        test_round_trip(&short).unwrap();
    }

    #[test]
    fn test_csv() {
        let mut colors = RadarColors::parse(&[0; 8]).unwrap();
        colors.set_land_color(2, 300);
        let csv = colors.to_csv();
        assert_eq!(csv, "ID;Color\n0x0000;0\n0x0001;0\n0x0002;300\n0x0003;0\n");

        let mut other = RadarColors::parse(&[0; 8]).unwrap();
        assert_eq!(other.apply_csv(&csv), 4);
        assert_eq!(other, colors);

        assert_eq!(other.apply_csv("# c\n1;0x10\n9;1\nbad\n0x3;-2\n"), 2);
        assert_eq!(other.colors(), &[0, 16, 300, -2]);
    }
}
