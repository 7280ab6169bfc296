//! Animation info table (`animinfo.mul`)
//!
//! A flat array of 4-byte records, two little-endian `u16` fields each. The
//! meaning of the fields is not documented, so they are kept raw.

use crate::MulFormat;
use crate::error::{EncodeResult, FormatError, Result};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

/// Size of one record in bytes
pub const ANIMINFO_ENTRY_SIZE: usize = 4;

/// One animation info record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct AnimInfoEntry {
    /// First field
    pub unknown1: u16,
    /// Second field
    pub unknown2: u16,
}

/// Animation info table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimInfo {
    entries: Vec<AnimInfoEntry>,
}

impl AnimInfo {
    /// Wrap existing entries
    pub fn new(entries: Vec<AnimInfoEntry>) -> Self {
        Self { entries }
    }

    /// All entries
    pub fn entries(&self) -> &[AnimInfoEntry] {
        &self.entries
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<AnimInfoEntry> {
        self.entries.get(index).copied()
    }

    /// Replace the entry at `index`, growing the table with zero entries
    pub fn set(&mut self, index: usize, entry: AnimInfoEntry) {
        if index >= self.entries.len() {
            self.entries.resize(index + 1, AnimInfoEntry::default());
        }
        self.entries[index] = entry;
    }
}

impl MulFormat for AnimInfo {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() % ANIMINFO_ENTRY_SIZE != 0 {
            return Err(FormatError::Misaligned {
                context: "animinfo",
                length: data.len(),
            });
        }
        let mut cursor = Cursor::new(data);
        let entries = (0..data.len() / ANIMINFO_ENTRY_SIZE)
            .map(|_| AnimInfoEntry::read(&mut cursor))
            .collect::<binrw::BinResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(self.entries.len() * ANIMINFO_ENTRY_SIZE));
        for entry in &self.entries {
            entry.write(&mut cursor)?;
        }
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{test_invalid_data_rejected, test_round_trip};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fields() {
        let raw = [0x04, 0x02, 0x04, 0x02, 0x01, 0x00, 0xFF, 0xFF];
        let info = AnimInfo::parse(&raw).unwrap();
        assert_eq!(info.entries().len(), 2);
        assert_eq!(
            info.get(0),
            Some(AnimInfoEntry {
                unknown1: 516,
                unknown2: 516
            })
        );
        assert_eq!(info.get(1).unwrap().unknown2, 0xFFFF);
        assert_eq!(info.get(2), None);
        assert_eq!(info.build().unwrap(), raw);
    }

    #[test]
    fn test_set_grows_table() {
        let mut info = AnimInfo::default();
        info.set(
            3,
            AnimInfoEntry {
                unknown1: 1,
                unknown2: 2,
            },
        );
        assert_eq!(info.entries().len(), 4);
        assert_eq!(info.get(1), Some(AnimInfoEntry::default()));
        test_round_trip(&info).unwrap();
    }

    #[test]
    fn test_misaligned_rejected() {
        test_invalid_data_rejected::<AnimInfo>(&[0; 6]).unwrap();
        assert!(AnimInfo::parse(&[]).unwrap().entries().is_empty());
    }
}
