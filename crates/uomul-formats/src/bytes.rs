//! Bounds-checked little-endian reads used by the RLE codecs

use crate::error::{FormatError, Result};

fn slice<'a>(data: &'a [u8], pos: usize, len: usize, context: &'static str) -> Result<&'a [u8]> {
    pos.checked_add(len)
        .and_then(|end| data.get(pos..end))
        .ok_or(FormatError::Truncated {
            context,
            needed: pos.saturating_add(len),
            available: data.len(),
        })
}

pub(crate) fn read_u16(data: &[u8], pos: usize, context: &'static str) -> Result<u16> {
    let b = slice(data, pos, 2, context)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn read_i16(data: &[u8], pos: usize, context: &'static str) -> Result<i16> {
    let b = slice(data, pos, 2, context)?;
    Ok(i16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn read_u32(data: &[u8], pos: usize, context: &'static str) -> Result<u32> {
    let b = slice(data, pos, 4, context)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_i32(data: &[u8], pos: usize, context: &'static str) -> Result<i32> {
    let b = slice(data, pos, 4, context)?;
    Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_bytes<'a>(
    data: &'a [u8],
    pos: usize,
    len: usize,
    context: &'static str,
) -> Result<&'a [u8]> {
    slice(data, pos, len, context)
}

/// Reinterpret a byte buffer as little-endian 16-bit words
pub(crate) fn words_le(data: &[u8], context: &'static str) -> Result<Vec<u16>> {
    if data.len() % 2 != 0 {
        return Err(FormatError::Misaligned {
            context,
            length: data.len(),
        });
    }
    Ok(data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect())
}

/// Decode a NUL-terminated latin-1 field, trimming surrounding whitespace
pub(crate) fn latin1_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    raw[..end]
        .iter()
        .map(|&b| char::from(b))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Encode `text` as latin-1 into a fixed-width NUL-padded field
///
/// Characters outside latin-1 become `?`; overlong text is truncated.
pub(crate) fn latin1_fixed<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [0u8; N];
    for (slot, ch) in out.iter_mut().zip(text.chars()) {
        *slot = u8::try_from(u32::from(ch)).unwrap_or(b'?');
    }
    out
}
