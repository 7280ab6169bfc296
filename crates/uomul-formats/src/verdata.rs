//! Patch overlay table (`verdata.mul`)
//!
//! ```text
//! verdata.mul
//! ├── count: i32
//! ├── PatchEntry × count (20 bytes each)
//! │   ├── file_id: i32   catalog tag (art = 4, gumps = 12, ...)
//! │   ├── index:   i32   record slot being replaced
//! │   ├── lookup:  i32   byte offset of the payload inside verdata.mul
//! │   ├── length:  i32
//! │   └── extra:   i32
//! └── payload blob
//! ```
//!
//! Patches are applied in file order, so when two entries target the same
//! slot the later one wins.

use crate::MulFormat;
use crate::error::{EncodeResult, FormatError, Result, ensure_len};
use crate::idx::IndexRecord;
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

/// Size of one patch entry in bytes
pub const PATCH_ENTRY_SIZE: usize = 20;

/// One redirected record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BinRead, BinWrite)]
#[brw(little)]
pub struct PatchEntry {
    /// Catalog the patch applies to
    pub file_id: i32,
    /// Record slot in that catalog
    pub index: i32,
    /// Payload offset in the overlay blob
    pub lookup: i32,
    /// Payload length
    pub length: i32,
    /// Replacement extra value
    pub extra: i32,
}

impl PatchEntry {
    /// Index record pointing into the overlay, with the patch flag set
    pub const fn to_index_record(&self) -> IndexRecord {
        IndexRecord::patched(self.lookup, self.length, self.extra)
    }
}

/// Parsed patch overlay header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchTable {
    entries: Vec<PatchEntry>,
}

impl PatchTable {
    /// Create a table from entries in file order
    pub fn new(entries: Vec<PatchEntry>) -> Self {
        Self { entries }
    }

    /// All entries in file order
    pub fn entries(&self) -> &[PatchEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries targeting one catalog, in file order
    pub fn for_file(&self, file_id: i32) -> impl Iterator<Item = &PatchEntry> {
        self.entries.iter().filter(move |e| e.file_id == file_id)
    }

    /// Effective patch for `(file_id, index)`: the last one in file order
    pub fn lookup(&self, file_id: i32, index: i32) -> Option<&PatchEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.file_id == file_id && e.index == index)
    }

    /// Overwrite patched slots of `records` and return how many were written
    ///
    /// Entries whose index falls outside `records` are ignored.
    pub fn apply(&self, file_id: i32, records: &mut [IndexRecord]) -> usize {
        let mut applied = 0;
        for entry in self.for_file(file_id) {
            let Ok(slot) = usize::try_from(entry.index) else {
                continue;
            };
            if let Some(record) = records.get_mut(slot) {
                *record = entry.to_index_record();
                applied += 1;
            }
        }
        applied
    }
}

impl MulFormat for PatchTable {
    fn parse(data: &[u8]) -> Result<Self> {
        ensure_len(data, 4, "verdata header")?;
        let count = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let Ok(count) = usize::try_from(count) else {
            return Err(FormatError::InvalidCount {
                context: "verdata",
                count: i64::from(count),
            });
        };

        let needed = count
            .checked_mul(PATCH_ENTRY_SIZE)
            .and_then(|n| n.checked_add(4))
            .unwrap_or(usize::MAX);
        ensure_len(data, needed, "verdata entries")?;

        let mut cursor = Cursor::new(&data[4..needed]);
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(PatchEntry::read(&mut cursor)?);
        }

        Ok(Self { entries })
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(4 + self.entries.len() * PATCH_ENTRY_SIZE));
        let count = i32::try_from(self.entries.len()).map_err(|_| crate::EncodeError::TooLarge {
            context: "verdata entry count",
            size: self.entries.len(),
            limit: i32::MAX as usize,
        })?;
        count.write_le(&mut cursor)?;
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
    use pretty_assertions::assert_eq;

    fn table_bytes(entries: &[[i32; 5]]) -> Vec<u8> {
        let mut out = (entries.len() as i32).to_le_bytes().to_vec();
        for e in entries {
            for v in e {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn test_parse_and_lookup() {
        let data = table_bytes(&[[4, 2, 100, 8, 0], [12, 2, 200, 4, 7], [4, 2, 300, 6, 1]]);
        let table = PatchTable::parse(&data).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.for_file(4).count(), 2);

        // Later entry wins
        let hit = table.lookup(4, 2).unwrap();
        assert_eq!(hit.lookup, 300);
        assert!(table.lookup(4, 3).is_none());

        PatchTable::verify_round_trip(&data).unwrap();
    }

    #[test]
    fn test_apply_marks_patch_flag_and_skips_out_of_bounds() {
        let data = table_bytes(&[[4, 1, 64, 10, 5], [4, 9, 0, 1, 0], [4, -3, 0, 1, 0], [6, 0, 0, 1, 0]]);
        let table = PatchTable::parse(&data).unwrap();

        let mut records = vec![IndexRecord::new(0, 4, 0), IndexRecord::EMPTY];
        let applied = table.apply(4, &mut records);

        assert_eq!(applied, 1);
        assert_eq!(records[0], IndexRecord::new(0, 4, 0));
        assert_eq!(records[1], IndexRecord::patched(64, 10, 5));
        assert!(records[1].is_patched());
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let data = (-1i32).to_le_bytes();
        assert!(matches!(
            PatchTable::parse(&data),
            Err(FormatError::InvalidCount { count: -1, .. })
        ));
    }

    #[test]
    fn test_short_header_and_entries_are_truncated() {
        assert!(matches!(
            PatchTable::parse(&[1, 0]),
            Err(FormatError::Truncated { .. })
        ));

        let mut data = table_bytes(&[[4, 0, 0, 1, 0], [4, 1, 0, 1, 0]]);
        data.truncate(data.len() - 3);
        assert!(matches!(
            PatchTable::parse(&data),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = PatchTable::parse(&0i32.to_le_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.build().unwrap(), 0i32.to_le_bytes().to_vec());
    }
}
