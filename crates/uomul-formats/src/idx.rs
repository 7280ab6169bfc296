//! Index record codec
//!
//! An index file is a flat array of 12-byte little-endian records:
//!
//! ```text
//! IndexRecord (12 bytes)
//! ├── offset: i32   byte offset into the data file (negative = empty)
//! ├── length: i32   payload length; bit 31 marks a patched record
//! └── extra:  i32   asset-specific payload (dimensions, texture size, ...)
//! ```
//!
//! Index files of current clients exceed 100K records, so stream decoding
//! reads in chunks rather than one record at a time.

use crate::error::{FormatError, Result};
use binrw::{BinRead, BinWrite};
use std::io::{ErrorKind, Read, Write};

/// Size of one index record in bytes
pub const INDEX_RECORD_SIZE: usize = 12;

/// Bit in `length` marking a record redirected by the patch overlay
pub const PATCH_FLAG: u32 = 0x8000_0000;

/// Records buffered per read in [`decode_all`]
const CHUNK_RECORDS: usize = 8192;

/// One `(offset, length, extra)` triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BinRead, BinWrite)]
#[brw(little)]
pub struct IndexRecord {
    /// Byte offset of the payload
    pub offset: i32,
    /// Payload length with the patch flag in bit 31
    pub length: i32,
    /// Asset-specific extra value
    pub extra: i32,
}

impl IndexRecord {
    /// The slot value written when an index is grown past its end
    pub const EMPTY: Self = Self {
        offset: -1,
        length: -1,
        extra: 0,
    };

    /// Create a record from raw field values
    pub const fn new(offset: i32, length: i32, extra: i32) -> Self {
        Self {
            offset,
            length,
            extra,
        }
    }

    /// Create a record with the patch flag set on `length`
    pub const fn patched(offset: i32, length: i32, extra: i32) -> Self {
        Self {
            offset,
            length: length | i32::MIN,
            extra,
        }
    }

    /// Payload length with the patch flag masked off
    pub const fn decoded_length(&self) -> i32 {
        self.length & 0x7FFF_FFFF
    }

    /// Whether the record points into the patch overlay
    pub const fn is_patched(&self) -> bool {
        (self.length as u32) & PATCH_FLAG != 0
    }

    /// Whether the record carries no payload
    pub const fn is_empty(&self) -> bool {
        self.offset < 0 || self.decoded_length() <= 0
    }

    /// Byte range `[offset, offset + decoded_length)` of a non-empty record
    pub fn byte_range(&self) -> Option<(u64, u64)> {
        if self.is_empty() {
            return None;
        }
        let start = u64::try_from(self.offset).ok()?;
        let len = u64::try_from(self.decoded_length()).ok()?;
        Some((start, start + len))
    }

    /// Parse one record from a 12-byte little-endian slice
    pub fn from_le_bytes(data: &[u8; INDEX_RECORD_SIZE]) -> Self {
        Self {
            offset: i32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            length: i32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            extra: i32::from_le_bytes([data[8], data[9], data[10], data[11]]),
        }
    }

    /// Serialize to 12 little-endian bytes
    pub fn to_le_bytes(&self) -> [u8; INDEX_RECORD_SIZE] {
        let mut out = [0u8; INDEX_RECORD_SIZE];
        out[0..4].copy_from_slice(&self.offset.to_le_bytes());
        out[4..8].copy_from_slice(&self.length.to_le_bytes());
        out[8..12].copy_from_slice(&self.extra.to_le_bytes());
        out
    }
}

impl Default for IndexRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}

fn push_records(out: &mut Vec<IndexRecord>, data: &[u8]) {
    out.extend(data.chunks_exact(INDEX_RECORD_SIZE).map(|chunk| {
        let mut raw = [0u8; INDEX_RECORD_SIZE];
        raw.copy_from_slice(chunk);
        IndexRecord::from_le_bytes(&raw)
    }));
}

/// Decode every record in an in-memory index
pub fn decode_slice(data: &[u8]) -> Result<Vec<IndexRecord>> {
    if data.len() % INDEX_RECORD_SIZE != 0 {
        return Err(FormatError::Truncated {
            context: "index",
            needed: data.len().next_multiple_of(INDEX_RECORD_SIZE),
            available: data.len(),
        });
    }
    let mut records = Vec::with_capacity(data.len() / INDEX_RECORD_SIZE);
    push_records(&mut records, data);
    Ok(records)
}

/// Decode every record from a stream until end of input
///
/// Reads in chunks of 8192 records. Trailing bytes that do not form a full
/// record fail with [`FormatError::Truncated`].
pub fn decode_all<R: Read>(mut reader: R) -> Result<Vec<IndexRecord>> {
    let mut records = Vec::new();
    let mut buf = vec![0u8; INDEX_RECORD_SIZE * CHUNK_RECORDS];
    let mut filled = 0usize;

    loop {
        let n = match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        filled += n;

        // Consume whole records, keep the partial tail for the next read
        let whole = filled - filled % INDEX_RECORD_SIZE;
        push_records(&mut records, &buf[..whole]);
        buf.copy_within(whole..filled, 0);
        filled -= whole;
    }

    if filled != 0 {
        return Err(FormatError::Truncated {
            context: "index",
            needed: INDEX_RECORD_SIZE,
            available: filled,
        });
    }

    Ok(records)
}

/// Encode records as a contiguous index file image
pub fn encode_all(records: &[IndexRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * INDEX_RECORD_SIZE);
    for record in records {
        out.extend_from_slice(&record.to_le_bytes());
    }
    out
}

/// Stream records to a writer
pub fn write_all<W: Write>(mut writer: W, records: &[IndexRecord]) -> std::io::Result<()> {
    for chunk in records.chunks(CHUNK_RECORDS) {
        writer.write_all(&encode_all(chunk))?;
    }
    writer.flush()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;
    use proptest::prelude::*;

    #[test]
    fn test_flags_and_emptiness() {
        let empty = IndexRecord::EMPTY;
        assert!(empty.is_empty());
        assert!(empty.is_patched());

        let plain = IndexRecord::new(4, 4, 0);
        assert!(!plain.is_empty());
        assert!(!plain.is_patched());
        assert_eq!(plain.byte_range(), Some((4, 8)));

        let patched = IndexRecord::patched(100, 20, 7);
        assert!(patched.is_patched());
        assert_eq!(patched.decoded_length(), 20);
        assert!(!patched.is_empty());

        assert!(IndexRecord::new(0, 0, 0).is_empty());
        assert!(IndexRecord::patched(8, 0, 0).is_empty());
    }

    #[test]
    fn test_decode_all_reads_across_chunks() {
        let records: Vec<IndexRecord> = (0..(CHUNK_RECORDS as i32 + 17))
            .map(|i| IndexRecord::new(i * 3, i, -i))
            .collect();
        let bytes = encode_all(&records);

        // A reader that only hands out 5 bytes at a time
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let n = self.0.len().min(buf.len()).min(5);
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }

        let decoded = decode_all(Trickle(&bytes)).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_trailing_bytes_are_truncation() {
        let mut bytes = encode_all(&[IndexRecord::new(1, 2, 3)]);
        bytes.extend_from_slice(&[0, 0, 0, 0, 0]);

        assert!(matches!(
            decode_all(bytes.as_slice()),
            Err(FormatError::Truncated { available: 5, .. })
        ));
        assert!(matches!(
            decode_slice(&bytes),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_binrw_matches_manual_layout() {
        let record = IndexRecord::patched(0x1234, 0x40, -1);
        let mut cursor = Cursor::new(Vec::new());
        record.write(&mut cursor).unwrap();
        assert_eq!(cursor.get_ref().as_slice(), record.to_le_bytes().as_slice());

        cursor.set_position(0);
        let read = IndexRecord::read(&mut cursor).unwrap();
        assert_eq!(read, record);
    }

    proptest! {
        #[test]
        fn prop_encode_decode_identity(raw in proptest::collection::vec(any::<(i32, i32, i32)>(), 0..200)) {
            let records: Vec<IndexRecord> = raw
                .into_iter()
                .map(|(o, l, e)| IndexRecord::new(o, l, e))
                .collect();
            let bytes = encode_all(&records);
            prop_assert_eq!(bytes.len(), records.len() * INDEX_RECORD_SIZE);
            prop_assert_eq!(decode_all(bytes.as_slice()).unwrap(), records);
        }
    }
}
