//! Error types shared by every codec in this crate
//!
//! Decoding problems are [`FormatError`]s: the bytes handed to a decoder are
//! structurally corrupt. Encoding problems are [`EncodeError`]s: the caller
//! supplied a value the on-disk layout cannot represent.

use thiserror::Error;

/// Structural corruption detected while decoding a record
#[derive(Debug, Error)]
pub enum FormatError {
    /// Input ended before a declared structure was complete
    #[error("{context} truncated: needed {needed} bytes, {available} available")]
    Truncated {
        /// What was being read
        context: &'static str,
        /// Bytes required to continue
        needed: usize,
        /// Bytes actually present
        available: usize,
    },

    /// A count field holds an impossible value
    #[error("{context} has invalid count {count}")]
    InvalidCount {
        /// What the count describes
        context: &'static str,
        /// Raw value read from the input
        count: i64,
    },

    /// Image dimensions are zero or negative
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Declared width
        width: i64,
        /// Declared height
        height: i64,
    },

    /// Input length is not a multiple of the element size
    #[error("{context} is not aligned: {length} bytes")]
    Misaligned {
        /// What was being read
        context: &'static str,
        /// Input length in bytes
        length: usize,
    },

    /// Accumulated run lengths in a row went past the image width
    #[error("row {row} overruns width {width} (reached x={end})")]
    RowOverrun {
        /// Row being decoded
        row: usize,
        /// X coordinate the run would end at
        end: usize,
        /// Image width
        width: usize,
    },

    /// A run-length field of zero where a positive length is required
    #[error("row {row} contains a zero-length run")]
    InvalidRunLength {
        /// Row being decoded
        row: usize,
    },

    /// A lookup table entry points outside the record
    #[error("lookup {index} points at offset {offset} outside {length} bytes")]
    InvalidLookup {
        /// Lookup table position
        index: usize,
        /// Resolved byte offset
        offset: i64,
        /// Record length in bytes
        length: usize,
    },

    /// Input length does not match any accepted layout
    #[error("{context} has unexpected length {length}")]
    UnexpectedLength {
        /// What was being read
        context: &'static str,
        /// Input length in bytes
        length: usize,
    },

    /// Multi record length fits both record sizes and no format hint was given
    #[error("multi record of {length} bytes matches both 12 and 16 byte layouts")]
    AmbiguousLength {
        /// Input length in bytes
        length: usize,
    },

    /// Binary read error from binrw
    #[error("Binary parsing error: {0}")]
    BinRead(String),

    /// IO error while reading a stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<binrw::Error> for FormatError {
    fn from(e: binrw::Error) -> Self {
        Self::BinRead(e.to_string())
    }
}

/// Caller-supplied value that cannot be encoded
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel buffer length does not match the declared dimensions
    #[error("expected {expected} pixels, got {actual}")]
    PixelCountMismatch {
        /// Pixels implied by the dimensions
        expected: usize,
        /// Pixels supplied
        actual: usize,
    },

    /// Dimensions are zero or exceed the format's field width
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// Texture edge is neither 64 nor 128
    #[error("texture size must be 64 or 128, got {0}")]
    InvalidTextureSize(usize),

    /// Encoded data would overflow an offset or length field
    #[error("{context} too large: {size} exceeds {limit}")]
    TooLarge {
        /// Field that overflowed
        context: &'static str,
        /// Value required
        size: usize,
        /// Largest representable value
        limit: usize,
    },

    /// A pixel value the format would read back as a different value
    #[error("{context} pixel {index} has unrepresentable value {value:#06x}")]
    UnrepresentablePixel {
        /// Image kind being encoded
        context: &'static str,
        /// Position in the pixel buffer
        index: usize,
        /// Offending pixel
        value: u16,
    },

    /// Animation uses more distinct colors than the palette holds
    #[error("animation uses {0} colors, palette holds 256")]
    TooManyColors(usize),

    /// A fixed-size collection has the wrong number of elements
    #[error("{context} must contain {expected} entries, got {actual}")]
    InvalidCount {
        /// Collection being encoded
        context: &'static str,
        /// Required number of entries
        expected: usize,
        /// Supplied number of entries
        actual: usize,
    },

    /// Glyph bitmap length does not match its dimensions
    #[error("glyph {index} has {actual} bytes of bitmap data, expected {expected}")]
    GlyphDataMismatch {
        /// Glyph position in the font
        index: usize,
        /// Bytes implied by width and height
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// A value cannot be placed in the run header bit fields
    #[error("{context} value {value} out of range")]
    OutOfRange {
        /// Field being encoded
        context: &'static str,
        /// Offending value
        value: i64,
    },

    /// Binary write error from binrw
    #[error("Binary write error: {0}")]
    BinWrite(String),
}

impl From<binrw::Error> for EncodeError {
    fn from(e: binrw::Error) -> Self {
        Self::BinWrite(e.to_string())
    }
}

/// Result type alias for decode operations
pub type Result<T> = std::result::Result<T, FormatError>;

/// Result type alias for encode operations
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;

/// Fail with [`FormatError::Truncated`] unless `data` holds `needed` bytes
pub(crate) fn ensure_len(data: &[u8], needed: usize, context: &'static str) -> Result<()> {
    if data.len() < needed {
        return Err(FormatError::Truncated {
            context,
            needed,
            available: data.len(),
        });
    }
    Ok(())
}
