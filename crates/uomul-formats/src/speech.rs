//! Speech keyword list (`speech.mul`)
//!
//! ```text
//! repeated until end of file:
//!   id:      u16, big-endian
//!   length:  u16, big-endian
//!   keyword: `length` bytes, UTF-8
//! ```
//!
//! Readers clamp `length` to 128; bytes past that are read as the start of
//! the next record.

use crate::MulFormat;
use crate::bytes::read_bytes;
use crate::error::{EncodeError, EncodeResult, Result};

/// Longest keyword read from a record
pub const MAX_KEYWORD_BYTES: usize = 128;

/// Keyword and the speech id it triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEntry {
    /// Speech id
    pub id: u16,
    /// Keyword text
    pub keyword: String,
}

/// Keywords in file order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpeechList {
    entries: Vec<SpeechEntry>,
}

impl SpeechList {
    /// Wrap existing entries
    pub fn new(entries: Vec<SpeechEntry>) -> Self {
        Self { entries }
    }

    /// Entries in file order
    pub fn entries(&self) -> &[SpeechEntry] {
        &self.entries
    }

    /// Mutable access for editing before a save
    pub fn entries_mut(&mut self) -> &mut Vec<SpeechEntry> {
        &mut self.entries
    }

    /// Keywords registered for `id`
    pub fn keywords(&self, id: u16) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |e| e.id == id)
            .map(|e| e.keyword.as_str())
    }

    /// Ids whose keyword equals `keyword`, ignoring ASCII case
    pub fn ids_for(&self, keyword: &str) -> Vec<u16> {
        self.entries
            .iter()
            .filter(|e| e.keyword.eq_ignore_ascii_case(keyword))
            .map(|e| e.id)
            .collect()
    }
}

impl MulFormat for SpeechList {
    fn parse(data: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let header = read_bytes(data, pos, 4, "speech entry")?;
            let id = u16::from_be_bytes([header[0], header[1]]);
            let length = usize::from(u16::from_be_bytes([header[2], header[3]])).min(MAX_KEYWORD_BYTES);
            pos += 4;

            let keyword = read_bytes(data, pos, length, "speech keyword")?;
            pos += length;
            entries.push(SpeechEntry {
                id,
                keyword: String::from_utf8_lossy(keyword).into_owned(),
            });
        }
        Ok(Self { entries })
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        let mut out = Vec::new();
        for entry in &self.entries {
            let keyword = entry.keyword.as_bytes();
            if keyword.len() > MAX_KEYWORD_BYTES {
                return Err(EncodeError::TooLarge {
                    context: "speech keyword",
                    size: keyword.len(),
                    limit: MAX_KEYWORD_BYTES,
                });
            }
            out.extend_from_slice(&entry.id.to_be_bytes());
            out.extend_from_slice(&(keyword.len() as u16).to_be_bytes());
            out.extend_from_slice(keyword);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{test_invalid_data_rejected, test_round_trip};
    use pretty_assertions::assert_eq;

    fn entry(id: u16, keyword: &str) -> SpeechEntry {
        SpeechEntry {
            id,
            keyword: keyword.to_string(),
        }
    }

    #[test]
    fn test_big_endian_layout() {
        let raw = [0x00, 0x2A, 0x00, 0x04, b'b', b'a', b'n', b'k', 0x01, 0x00, 0x00, 0x00];
        let list = SpeechList::parse(&raw).unwrap();
        assert_eq!(list.entries(), &[entry(42, "bank"), entry(256, "")]);
        assert_eq!(list.build().unwrap(), raw);
    }

    #[test]
    fn test_lookups() {
        let list = SpeechList::new(vec![entry(1, "Vendor Buy"), entry(2, "bank"), entry(1, "buy")]);
        assert_eq!(list.keywords(1).collect::<Vec<_>>(), vec!["Vendor Buy", "buy"]);
        assert_eq!(list.ids_for("BANK"), vec![2]);
        assert!(list.ids_for("guards").is_empty());
        test_round_trip(&list).unwrap();
    }

    #[test]
    fn test_long_length_is_clamped() {
        let mut raw = vec![0x00, 0x07, 0x00, 0xC8];
        raw.extend_from_slice(&[b'a'; 128]);
        // The next four bytes are read as a fresh record
        raw.extend_from_slice(&[0x00, 0x08, 0x00, 0x01, b'z']);
        let list = SpeechList::parse(&raw).unwrap();
        assert_eq!(list.entries().len(), 2);
        assert_eq!(list.entries()[0].keyword.len(), 128);
        assert_eq!(list.entries()[1], entry(8, "z"));

        let long = SpeechList::new(vec![entry(1, &"x".repeat(129))]);
        assert!(matches!(long.build(), Err(EncodeError::TooLarge { .. })));
    }

    #[test]
    fn test_truncated_rejected() {
        test_invalid_data_rejected::<SpeechList>(&[0x00, 0x01, 0x00]).unwrap();
        test_invalid_data_rejected::<SpeechList>(&[0x00, 0x01, 0x00, 0x03, b'a']).unwrap();
        assert!(SpeechList::parse(&[]).unwrap().entries().is_empty());
    }
}
