//! File access layer for legacy MUL/IDX client installations.
//!
//! This crate locates a client's asset files on disk and turns index records
//! into payload bytes, which the codecs in `uomul-formats` then decode. The
//! pieces, from the bottom up:
//!
//! - **Verdata**: the optional `verdata.mul` patch overlay, loaded once and
//!   shared by every index
//! - **FileIndex**: one index/data pair with patches applied and every read
//!   bounds checked against the backing files
//! - **MulPair**: the write path for index/data pairs
//! - **Stores**: keyed record access with memory mapping and LRU caching
//! - **Assets**: typed facades (art, gumps, map, ...) built from a
//!   [`ClientFiles`]
//!
//! # Example
//!
//! ```rust,ignore
//! use uomul_storage::{ClientConfig, ClientFiles};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let files = ClientFiles::open(ClientConfig::new("/games/client"))?;
//! let art = files.art();
//! if let Some(tile) = art.land(0x0003)? {
//!     println!("land tile with {} pixels", tile.pixels.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Availability
//!
//! Per-record reads never fail because a file is missing or a record points
//! past the end of its file; they return `None` and log at `debug`. Errors
//! are reserved for structurally corrupt index or overlay headers and for
//! records that exist but do not decode.

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]

use std::path::PathBuf;
use thiserror::Error;
use uomul_formats::{EncodeError, FormatError};

// Typed asset facades
pub mod assets;

// Client entry point
pub mod client;

// Configuration
pub mod config;

// Index/data pair access
pub mod file_index;

// Writable index/data pairs
pub mod pair;

// Case-insensitive file lookup
pub mod paths;

// Keyed record stores
pub mod store;

// Patch overlay
pub mod verdata;

pub use client::ClientFiles;
pub use config::{AssetFileNames, ClientConfig};
pub use file_index::{
    FileIndex, FileIndexReader, FileIndexSnapshot, IntegrityReport, RawRecord, RecordLocation,
    RecordSource, ValidIndices,
};
pub use pair::MulPair;
pub use store::{AssetStore, CacheStats, CachedStore, MmapStore, MulIdxStore};
pub use verdata::Verdata;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes are structurally corrupt.
    #[error("Invalid format: {0}")]
    Format(#[from] FormatError),

    /// A value could not be encoded for writing.
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Caller-supplied index outside the index file.
    #[error("Index {index} out of range (0..{count})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of records
        count: usize,
    },

    /// Facade was built without a writable pair.
    #[error("Not writable: {0}")]
    NotWritable(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
}
