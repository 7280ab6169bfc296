//! Test utilities for format round-trip testing
//!
//! Shared helpers for the `MulFormat` implementations' test modules.

use crate::MulFormat;
use std::fmt::Debug;

/// Build a value, parse the bytes back and compare
///
/// # Returns
/// * `Ok(())` if round-trip succeeds and values match
/// * `Err` if building, parsing, or comparison fails
pub fn test_round_trip<T>(original: &T) -> Result<(), Box<dyn std::error::Error>>
where
    T: MulFormat + PartialEq + Debug,
{
    let data = original.build()?;
    let parsed = T::parse(&data)?;

    if original != &parsed {
        return Err(format!(
            "Round-trip verification failed:\nOriginal: {:?}\nParsed: {:?}",
            original, parsed
        )
        .into());
    }

    Ok(())
}

/// Parse existing bytes, rebuild them and parse again
///
/// Useful for inputs that normalize on parse (padding, defaults) where the
/// rebuilt bytes legitimately differ from the input.
pub fn test_round_trip_with_data<T>(data: &[u8]) -> Result<(), Box<dyn std::error::Error>>
where
    T: MulFormat + PartialEq + Debug,
{
    let parsed = T::parse(data)?;
    let rebuilt = parsed.build()?;
    let reparsed = T::parse(&rebuilt)?;

    if parsed != reparsed {
        return Err(format!(
            "Round-trip with data failed:\nParsed: {:?}\nReparsed: {:?}",
            parsed, reparsed
        )
        .into());
    }

    Ok(())
}

/// Check that parsing `invalid_data` fails
pub fn test_invalid_data_rejected<T>(invalid_data: &[u8]) -> Result<(), Box<dyn std::error::Error>>
where
    T: MulFormat,
{
    match T::parse(invalid_data) {
        Ok(_) => Err("Expected parsing to fail for invalid data, but it succeeded".into()),
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{EncodeResult, FormatError, Result};

    #[derive(Debug, PartialEq)]
    struct Counter {
        value: u32,
    }

    impl MulFormat for Counter {
        fn parse(data: &[u8]) -> Result<Self> {
            let bytes: [u8; 4] = data.try_into().map_err(|_| FormatError::UnexpectedLength {
                context: "counter",
                length: data.len(),
            })?;
            Ok(Self {
                value: u32::from_le_bytes(bytes),
            })
        }

        fn build(&self) -> EncodeResult<Vec<u8>> {
            Ok(self.value.to_le_bytes().to_vec())
        }
    }

    #[test]
    fn test_helpers() {
        test_round_trip(&Counter { value: 42 }).expect("Round-trip should succeed");
        test_round_trip_with_data::<Counter>(&7u32.to_le_bytes())
            .expect("Round-trip with data should succeed");
        test_invalid_data_rejected::<Counter>(&[1, 2]).expect("Should reject invalid data");
        assert!(Counter::verify_round_trip(&[1, 2, 3, 4]).is_ok());
    }
}
