//! Sound records (`sound.mul`)
//!
//! ```text
//! name: 32 bytes, ASCII, NUL padded
//! pcm:  remaining bytes, signed 16-bit little-endian, mono, 22050 Hz
//! ```

use crate::error::{FormatError, Result};

/// Size of the name field
pub const SOUND_NAME_BYTES: usize = 32;

/// Sample rate of every record
pub const SOUND_SAMPLE_RATE: u32 = 22050;

/// Channel count of every record
pub const SOUND_CHANNELS: u16 = 1;

/// A named PCM clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundRecord {
    /// Clip name, usually the original file name
    pub name: String,
    /// Raw signed 16-bit little-endian samples
    pub pcm: Vec<u8>,
}

impl SoundRecord {
    /// Number of whole samples
    pub fn sample_count(&self) -> usize {
        self.pcm.len() / 2
    }

    /// Clip length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.sample_count() as f64 / f64::from(SOUND_SAMPLE_RATE)
    }

    /// Samples as `i16`, ignoring a trailing odd byte
    pub fn samples(&self) -> Vec<i16> {
        self.pcm
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect()
    }
}

/// Decode a sound record
pub fn decode_sound(raw: &[u8]) -> Result<SoundRecord> {
    if raw.len() < SOUND_NAME_BYTES {
        return Err(FormatError::Truncated {
            context: "sound name",
            needed: SOUND_NAME_BYTES,
            available: raw.len(),
        });
    }
    let (name, pcm) = raw.split_at(SOUND_NAME_BYTES);
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    let name = name[..end]
        .iter()
        .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
        .collect::<String>();
    Ok(SoundRecord {
        name: name.trim().to_string(),
        pcm: pcm.to_vec(),
    })
}

/// Encode a sound record; the name is truncated to 32 bytes and non-ASCII
/// characters become `?`
pub fn encode_sound(sound: &SoundRecord) -> Vec<u8> {
    let mut out = Vec::with_capacity(SOUND_NAME_BYTES + sound.pcm.len());
    out.extend(
        sound
            .name
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .take(SOUND_NAME_BYTES),
    );
    out.resize(SOUND_NAME_BYTES, 0);
    out.extend_from_slice(&sound.pcm);
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let sound = SoundRecord {
            name: "bell.wav".to_string(),
            pcm: vec![0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80],
        };
        let raw = encode_sound(&sound);
        assert_eq!(raw.len(), 38);
        assert_eq!(&raw[..9], b"bell.wav\0");

        let decoded = decode_sound(&raw).unwrap();
        assert_eq!(decoded, sound);
        assert_eq!(decoded.samples(), vec![1, -1, i16::MIN]);
        assert_eq!(decoded.sample_count(), 3);
    }

    #[test]
    fn test_long_and_non_ascii_names() {
        let sound = SoundRecord {
            name: format!("{}\u{e9}", "x".repeat(40)),
            pcm: Vec::new(),
        };
        let raw = encode_sound(&sound);
        assert_eq!(raw.len(), SOUND_NAME_BYTES);
        assert_eq!(decode_sound(&raw).unwrap().name, "x".repeat(32));

        let accent = encode_sound(&SoundRecord {
            name: "caf\u{e9}".to_string(),
            pcm: Vec::new(),
        });
        assert_eq!(&accent[..5], b"caf?\0");
    }

    #[test]
    fn test_short_record() {
        assert!(matches!(
            decode_sound(&[0; 31]),
            Err(FormatError::Truncated { needed: 32, .. })
        ));
        let empty = decode_sound(&[0; 32]).unwrap();
        assert_eq!(empty.name, "");
        assert!(empty.duration_secs().abs() < f64::EPSILON);
    }
}
