//! Hue table (`hues.mul`)
//!
//! ```text
//! HueBlock × 375 (708 bytes each)
//! ├── header: i32 (unused)
//! └── HueEntry × 8 (88 bytes each)
//!     ├── colors:      u16 × 32 (alpha bit inverted)
//!     ├── table_start: u16 (alpha bit inverted)
//!     ├── table_end:   u16 (alpha bit inverted)
//!     └── name:        20 bytes, latin-1, NUL padded
//! ```
//!
//! The table always holds 3000 hues after decoding and is always written
//! with 3000 hues.

use crate::MulFormat;
use crate::bytes::{latin1_field, latin1_fixed};
use crate::color::channels;
use crate::error::{EncodeResult, Result};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

/// Number of hues in a table
pub const HUE_COUNT: usize = 3000;

/// Number of 8-hue blocks in a table
pub const HUE_BLOCKS: usize = 375;

/// Size of one block in bytes
pub const HUE_BLOCK_SIZE: usize = 708;

const HUES_PER_BLOCK: usize = 8;

#[derive(BinRead, BinWrite)]
#[brw(little)]
struct RawHue {
    colors: [u16; 32],
    table_start: u16,
    table_end: u16,
    name: [u8; 20],
}

#[derive(BinRead, BinWrite)]
#[brw(little)]
struct RawHueBlock {
    header: i32,
    entries: [RawHue; HUES_PER_BLOCK],
}

/// A 32-step color ramp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hue {
    /// Ramp colors, indexed by a pixel's 5-bit red channel
    pub colors: [u16; 32],
    /// First color of the ramp's usable range
    pub table_start: u16,
    /// Last color of the ramp's usable range
    pub table_end: u16,
    /// Display name, at most 20 latin-1 characters
    pub name: String,
}

impl Default for Hue {
    fn default() -> Self {
        Self {
            colors: [0; 32],
            table_start: 0,
            table_end: 0,
            name: String::new(),
        }
    }
}

impl Hue {
    /// Recolor pixels through this ramp
    ///
    /// Each nonzero pixel is replaced by the ramp color selected by its red
    /// channel. With `only_gray`, pixels whose channels differ are kept.
    pub fn apply(&self, pixels: &[u16], only_gray: bool) -> Vec<u16> {
        pixels
            .iter()
            .map(|&p| {
                if p == 0 {
                    return p;
                }
                let (r, g, b) = channels(p);
                if only_gray && !(r == g && g == b) {
                    return p;
                }
                self.colors[usize::from(r)]
            })
            .collect()
    }

    fn from_raw(raw: &RawHue) -> Self {
        let mut colors = raw.colors;
        for c in &mut colors {
            *c ^= 0x8000;
        }
        Self {
            colors,
            table_start: raw.table_start ^ 0x8000,
            table_end: raw.table_end ^ 0x8000,
            name: latin1_field(&raw.name),
        }
    }

    fn to_raw(&self) -> RawHue {
        let mut colors = self.colors;
        for c in &mut colors {
            *c ^= 0x8000;
        }
        RawHue {
            colors,
            table_start: self.table_start ^ 0x8000,
            table_end: self.table_end ^ 0x8000,
            name: latin1_fixed(&self.name),
        }
    }
}

/// All hues of a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HueTable {
    hues: Vec<Hue>,
}

impl Default for HueTable {
    fn default() -> Self {
        Self {
            hues: vec![Hue::default(); HUE_COUNT],
        }
    }
}

impl HueTable {
    /// Build a table, padding or truncating to 3000 hues
    pub fn new(mut hues: Vec<Hue>) -> Self {
        hues.resize(HUE_COUNT, Hue::default());
        Self { hues }
    }

    /// All hues in order
    pub fn hues(&self) -> &[Hue] {
        &self.hues
    }

    /// Mutable access for editing before a save
    pub fn hues_mut(&mut self) -> &mut [Hue] {
        &mut self.hues
    }

    /// Hue for a client hue id
    ///
    /// The id is masked to 14 bits; ids past the table fall back to hue 0.
    pub fn get(&self, index: u32) -> &Hue {
        let index = (index & 0x3FFF) as usize;
        self.hues.get(index).unwrap_or(&self.hues[0])
    }
}

impl MulFormat for HueTable {
    /// Decode up to 375 blocks; short input is padded with default hues
    fn parse(data: &[u8]) -> Result<Self> {
        let block_count = (data.len() / HUE_BLOCK_SIZE).min(HUE_BLOCKS);
        let mut cursor = Cursor::new(&data[..block_count * HUE_BLOCK_SIZE]);

        let mut hues = Vec::with_capacity(HUE_COUNT);
        for _ in 0..block_count {
            let block = RawHueBlock::read(&mut cursor)?;
            hues.extend(block.entries.iter().map(Hue::from_raw));
        }

        Ok(Self::new(hues))
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HUE_BLOCKS * HUE_BLOCK_SIZE));
        let default = Hue::default();
        for block in 0..HUE_BLOCKS {
            let entries: [RawHue; HUES_PER_BLOCK] = std::array::from_fn(|j| {
                self.hues
                    .get(block * HUES_PER_BLOCK + j)
                    .unwrap_or(&default)
                    .to_raw()
            });
            RawHueBlock { header: 0, entries }.write(&mut cursor)?;
        }
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::test_round_trip_with_data;
    use pretty_assertions::assert_eq;

    fn sample_hue(seed: u16) -> Hue {
        Hue {
            colors: std::array::from_fn(|i| seed.wrapping_add(i as u16) | 0x8000),
            table_start: seed,
            table_end: seed + 31,
            name: format!("hue {seed}"),
        }
    }

    #[test]
    fn test_short_input_padded_to_3000() {
        let mut table = HueTable::default();
        table.hues_mut()[0] = sample_hue(1);
        table.hues_mut()[9] = sample_hue(2);

        let full = table.build().unwrap();
        assert_eq!(full.len(), HUE_BLOCKS * HUE_BLOCK_SIZE);

        // Keep only two blocks plus a partial third
        let short = &full[..HUE_BLOCK_SIZE * 2 + 100];
        let parsed = HueTable::parse(short).unwrap();
        assert_eq!(parsed.hues().len(), HUE_COUNT);
        assert_eq!(parsed.hues()[0], sample_hue(1));
        assert_eq!(parsed.hues()[9], sample_hue(2));
        assert_eq!(parsed.hues()[16], Hue::default());
        assert_eq!(parsed.build().unwrap().len(), full.len());
        // Padding survives a rebuild
        test_round_trip_with_data::<HueTable>(short).unwrap();
    }

    #[test]
    fn test_long_input_truncated_to_3000() {
        let hues: Vec<Hue> = (0..3100).map(|i| sample_hue(i as u16)).collect();
        let table = HueTable::new(hues);
        assert_eq!(table.hues().len(), HUE_COUNT);

        let mut raw = table.build().unwrap();
        raw.extend_from_slice(&[0xAB; HUE_BLOCK_SIZE * 2]);
        let parsed = HueTable::parse(&raw).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_zero_file_decodes_alpha_colors() {
        let parsed = HueTable::parse(&[0u8; HUE_BLOCK_SIZE]).unwrap();
        assert_eq!(parsed.hues()[0].colors, [0x8000; 32]);
        assert_eq!(parsed.hues()[0].name, "");
        assert_eq!(parsed.hues()[8], Hue::default());
    }

    #[test]
    fn test_get_masks_and_falls_back() {
        let mut table = HueTable::default();
        table.hues_mut()[5] = sample_hue(5);
        table.hues_mut()[0] = sample_hue(0);
        assert_eq!(table.get(5).name, "hue 5");
        assert_eq!(table.get(0x4005).name, "hue 5");
        assert_eq!(table.get(3500).name, "hue 0");
    }

    #[test]
    fn test_apply_by_red_channel() {
        let mut hue = Hue::default();
        for (i, c) in hue.colors.iter_mut().enumerate() {
            *c = 0x8000 | i as u16;
        }
        let gray = 0x8000 | (4 << 10) | (4 << 5) | 4;
        let red = 0x8000 | (9 << 10);

        assert_eq!(hue.apply(&[0, gray, red], false), vec![0, 0x8004, 0x8009]);
        assert_eq!(hue.apply(&[0, gray, red], true), vec![0, 0x8004, red]);
    }

    #[test]
    fn test_name_truncated_to_field() {
        let mut table = HueTable::default();
        table.hues_mut()[0].name = "abcdefghijklmnopqrstuvwxyz".to_string();
        let parsed = HueTable::parse(&table.build().unwrap()).unwrap();
        assert_eq!(parsed.hues()[0].name, "abcdefghijklmnopqrst");
    }
}
