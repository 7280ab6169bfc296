//! Binary codecs for legacy MUL/IDX client asset containers
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_sign_loss)] // Signed fields reinterpreted as raw bits
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::cast_precision_loss)] // Durations and rounding
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Many format-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::map_unwrap_or)] // Binary format patterns
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::missing_errors_doc)] // Error types are documented per variant
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! The client stores its assets in a handful of container shapes: paired
//! index and data files (`artidx.mul` + `art.mul`), single structured blobs
//! (`hues.mul`, `tiledata.mul`) and an optional patch overlay
//! (`verdata.mul`). This crate holds the byte-level side of all of them.
//! Every codec is a pure function over byte slices; locating and reading
//! files is left to `uomul-storage`.
//!
//! # Supported Formats
//!
//! - **Index records**: 12-byte `(offset, length, extra)` triples with the
//!   patched flag in the length's top bit
//! - **Patch overlay**: `verdata.mul` redirect table
//! - **Art**: 44×44 land diamonds and run-length encoded statics
//! - **Gumps**, **textures**, **animations**, **lights**
//! - **Hues**, **ASCII fonts**, **unicode fonts**
//! - **Map** land and static blocks, **multis** plus their text formats
//! - **Tile data**, **radar colors**, **sounds**, **skills**, **skill groups**
//! - **Cliloc** string tables, **speech** keywords, **animation info**
//! - **Def files**: legacy id translation tables
//!
//! # Pixels
//!
//! Every image decoder yields ARGB1555 pixels (`u16`, alpha in bit 15).
//! Conversion to 8-bit RGBA goes through [`color::PixelConverter`].

#![warn(missing_docs)]

/// Animation frames with a shared 256-color palette
pub mod animation;
pub mod animinfo;
/// Land tiles and static item art
pub mod art;
pub(crate) mod bytes;
/// Localized string tables
pub mod cliloc;
/// ARGB1555 pixel helpers and RGBA conversion
pub mod color;
pub mod def;
mod error;
/// ASCII and unicode bitmap fonts
pub mod fonts;
/// Gump (UI image) run-length rows
pub mod gump;
pub mod hues;
/// Index record codec for `*idx.mul` files
///
/// Index files are flat arrays of 12-byte records. Each record locates one
/// asset in the paired data file, or in the patch overlay when the top bit
/// of its length is set.
pub mod idx;
pub mod light;
/// Map land blocks, static blocks and facet sizes
pub mod map;
/// Multi-structure component lists and their text formats
pub mod multi;
pub mod radarcol;
pub mod skill;
pub mod skill_groups;
pub mod sound;
pub mod speech;
pub mod texture;
/// Tile flags and properties
pub mod tiledata;
/// Patch overlay (`verdata.mul`) table
///
/// The overlay redirects individual records of any index/data pair into a
/// single shared blob. Patches are keyed by a per-asset file id.
pub mod verdata;

pub use error::{EncodeError, EncodeResult, FormatError, Result};

// Test utilities module
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

/// Common trait for self-contained formats
///
/// Implemented by formats that need no context beyond their own bytes. Record
/// codecs that depend on index metadata (dimensions in `extra`, a flip flag)
/// are free functions instead.
pub trait MulFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self>;

    /// Build to bytes
    fn build(&self) -> EncodeResult<Vec<u8>>;

    /// Verify that parsing then building reproduces `data` exactly
    fn verify_round_trip(data: &[u8]) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err("Round-trip verification failed".into());
        }
        Ok(())
    }
}
