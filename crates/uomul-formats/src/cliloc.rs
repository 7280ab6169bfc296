//! Localized string tables (`cliloc.<lang>`)
//!
//! ```text
//! header1: i32
//! header2: i16
//! entries until end of file:
//!   number: i32
//!   flag:   u8
//!   length: i16
//!   text:   `length` bytes, UTF-8
//! ```
//!
//! Entries are written sorted by number. Text may carry positional
//! placeholders such as `~1_NAME~`, filled in by [`ClilocEntry::format`].

use crate::MulFormat;
use crate::bytes::{read_bytes, read_i16, read_i32};
use crate::error::{EncodeError, EncodeResult, FormatError, Result};
use std::collections::BTreeMap;

/// Longest text an entry can hold
pub const MAX_CLILOC_TEXT: usize = 0x7FFF;

/// Arguments beyond this position are ignored by [`ClilocEntry::format`]
pub const MAX_FORMAT_ARGS: usize = 10;

const HEADER_SIZE: usize = 6;
const ENTRY_HEADER_SIZE: usize = 7;

/// Edit state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClilocFlag {
    /// Shipped text
    #[default]
    Original,
    /// Added by a shard
    Custom,
    /// Shipped text changed by a shard
    Modified,
    /// Any other flag byte
    Other(u8),
}

impl From<u8> for ClilocFlag {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Original,
            1 => Self::Custom,
            2 => Self::Modified,
            other => Self::Other(other),
        }
    }
}

impl From<ClilocFlag> for u8 {
    fn from(flag: ClilocFlag) -> Self {
        match flag {
            ClilocFlag::Original => 0,
            ClilocFlag::Custom => 1,
            ClilocFlag::Modified => 2,
            ClilocFlag::Other(other) => other,
        }
    }
}

/// One localized string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClilocEntry {
    /// Edit state
    pub flag: ClilocFlag,
    /// Raw text with placeholders
    pub text: String,
}

/// Parse a `~<digits><word>~` placeholder from the text following a `~`
///
/// Returns the argument number and the bytes consumed, closing `~` included.
fn placeholder(rest: &str) -> Option<(usize, usize)> {
    let bytes = rest.as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    let word = bytes[digits..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    let close = digits + word;
    if bytes.get(close) != Some(&b'~') {
        return None;
    }
    // `~12~` reads as argument 1 named "2"
    let number_len = if word == 0 { digits.checked_sub(1)? } else { digits };
    if number_len == 0 {
        return None;
    }
    let number = rest[..number_len].parse().ok()?;
    Some((number, close + 1))
}

impl ClilocEntry {
    /// Fill placeholders with `args`
    ///
    /// Placeholder numbers are 1-based. `~0_X~`, numbers past the supplied
    /// arguments and numbers past [`MAX_FORMAT_ARGS`] become empty strings.
    pub fn format(&self, args: &[&str]) -> String {
        let arg = |n: usize| -> &str {
            match n.checked_sub(1) {
                Some(i) if i < MAX_FORMAT_ARGS => args.get(i).copied().unwrap_or(""),
                _ => "",
            }
        };

        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(pos) = rest.find('~') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            match placeholder(after) {
                Some((n, used)) => {
                    out.push_str(arg(n));
                    rest = &after[used..];
                }
                None => {
                    out.push('~');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Fill placeholders from a tab-separated argument string
    pub fn split_format(&self, args: &str) -> String {
        let parts: Vec<&str> = args.split('\t').collect();
        self.format(&parts)
    }
}

/// Localized string table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cliloc {
    /// First header field, preserved on save
    pub header1: i32,
    /// Second header field, preserved on save
    pub header2: i16,
    entries: BTreeMap<i32, ClilocEntry>,
}

impl Cliloc {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `number`
    pub fn entry(&self, number: i32) -> Option<&ClilocEntry> {
        self.entries.get(&number)
    }

    /// Raw text for `number`
    pub fn get_string(&self, number: i32) -> Option<&str> {
        self.entries.get(&number).map(|e| e.text.as_str())
    }

    /// Insert or replace an entry, returning the previous one
    pub fn set(&mut self, number: i32, entry: ClilocEntry) -> Option<ClilocEntry> {
        self.entries.insert(number, entry)
    }

    /// Remove an entry
    pub fn remove(&mut self, number: i32) -> Option<ClilocEntry> {
        self.entries.remove(&number)
    }

    /// Entries in ascending number order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &ClilocEntry)> {
        self.entries.iter().map(|(&n, e)| (n, e))
    }
}

impl MulFormat for Cliloc {
    /// Decode a table
    ///
    /// A negative length is read as zero. Invalid UTF-8 is replaced. When a
    /// number repeats, the later entry wins.
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(FormatError::Truncated {
                context: "cliloc header",
                needed: HEADER_SIZE,
                available: data.len(),
            });
        }
        let header1 = read_i32(data, 0, "cliloc header")?;
        let header2 = read_i16(data, 4, "cliloc header")?;

        let mut entries = BTreeMap::new();
        let mut pos = HEADER_SIZE;
        while pos < data.len() {
            read_bytes(data, pos, ENTRY_HEADER_SIZE, "cliloc entry")?;
            let number = read_i32(data, pos, "cliloc entry")?;
            let flag = ClilocFlag::from(data[pos + 4]);
            let length = usize::try_from(read_i16(data, pos + 5, "cliloc entry")?).unwrap_or(0);
            pos += ENTRY_HEADER_SIZE;

            let raw = read_bytes(data, pos, length, "cliloc text")?;
            pos += length;
            entries.insert(
                number,
                ClilocEntry {
                    flag,
                    text: String::from_utf8_lossy(raw).into_owned(),
                },
            );
        }

        Ok(Self {
            header1,
            header2,
            entries,
        })
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.entries.len() * 32);
        out.extend_from_slice(&self.header1.to_le_bytes());
        out.extend_from_slice(&self.header2.to_le_bytes());
        for (&number, entry) in &self.entries {
            let text = entry.text.as_bytes();
            let length = i16::try_from(text.len()).map_err(|_| EncodeError::TooLarge {
                context: "cliloc text",
                size: text.len(),
                limit: MAX_CLILOC_TEXT,
            })?;
            out.extend_from_slice(&number.to_le_bytes());
            out.push(u8::from(entry.flag));
            out.extend_from_slice(&length.to_le_bytes());
            out.extend_from_slice(text);
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

    fn table_bytes(entries: &[(i32, u8, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&123i32.to_le_bytes());
        out.extend_from_slice(&7i16.to_le_bytes());
        for &(number, flag, text) in entries {
            out.extend_from_slice(&number.to_le_bytes());
            out.push(flag);
            out.extend_from_slice(&(text.len() as i16).to_le_bytes());
            out.extend_from_slice(text.as_bytes());
        }
        out
    }

    #[test]
    fn test_parse_and_format() {
        let raw = table_bytes(&[
            (1000, 0, "Hello"),
            (1001, 1, "You see ~1_ITEM~."),
            (1002, 2, "~1_NAME~ gives ~2_TARGET~ a hug"),
        ]);
        let cliloc = Cliloc::parse(&raw).unwrap();
        assert_eq!((cliloc.header1, cliloc.header2), (123, 7));
        assert_eq!(cliloc.len(), 3);
        assert_eq!(cliloc.get_string(1000), Some("Hello"));
        assert_eq!(cliloc.get_string(999), None);

        let seen = cliloc.entry(1001).unwrap();
        assert_eq!(seen.flag, ClilocFlag::Custom);
        assert_eq!(seen.format(&["a sword"]), "You see a sword.");

        let hug = cliloc.entry(1002).unwrap();
        assert_eq!(hug.flag, ClilocFlag::Modified);
        assert_eq!(hug.split_format("Alice\tBob"), "Alice gives Bob a hug");

        // Sorted input rebuilds byte for byte
        assert_eq!(cliloc.build().unwrap(), raw);
    }

    #[test]
    fn test_format_edge_cases() {
        let entry = ClilocEntry {
            flag: ClilocFlag::Original,
            text: "~0_X~[~3_MISSING~] ~12~ ~ not ~_a~ ~1_ok~".to_string(),
        };
        assert_eq!(entry.format(&["one"]), "[] one ~ not ~_a~ one");

        let many = ClilocEntry {
            flag: ClilocFlag::Original,
            text: "~10_A~~11_B~".to_string(),
        };
        let args: Vec<String> = (1..=11).map(|i| i.to_string()).collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        assert_eq!(many.format(&args), "10");
    }

    #[test]
    fn test_save_sorts_and_rejects_long_text() {
        let mut cliloc = Cliloc::default();
        cliloc.set(
            5,
            ClilocEntry {
                flag: ClilocFlag::Other(9),
                text: "five".to_string(),
            },
        );
        cliloc.set(1, ClilocEntry::default());
        test_round_trip(&cliloc).unwrap();
        let raw = cliloc.build().unwrap();
        assert_eq!(&raw[6..10], &1i32.to_le_bytes());
        assert_eq!(raw[17], 9);

        cliloc.set(
            2,
            ClilocEntry {
                flag: ClilocFlag::Original,
                text: "x".repeat(MAX_CLILOC_TEXT + 1),
            },
        );
        assert!(matches!(
            cliloc.build(),
            Err(EncodeError::TooLarge { limit: MAX_CLILOC_TEXT, .. })
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        test_invalid_data_rejected::<Cliloc>(&[0; 5]).unwrap();

        let raw = table_bytes(&[(1, 0, "abc")]);
        test_invalid_data_rejected::<Cliloc>(&raw[..raw.len() - 1]).unwrap();
        test_invalid_data_rejected::<Cliloc>(&raw[..HEADER_SIZE + 3]).unwrap();
    }

    #[test]
    fn test_negative_length_and_duplicates() {
        let mut raw = table_bytes(&[(4, 0, "first"), (4, 0, "second")]);
        raw.extend_from_slice(&8i32.to_le_bytes());
        raw.push(0);
        raw.extend_from_slice(&(-3i16).to_le_bytes());

        let cliloc = Cliloc::parse(&raw).unwrap();
        assert_eq!(cliloc.get_string(4), Some("second"));
        assert_eq!(cliloc.get_string(8), Some(""));
        assert_eq!(cliloc.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec![4, 8]);
    }
}
