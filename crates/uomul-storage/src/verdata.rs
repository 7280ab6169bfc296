//! Patch overlay (`verdata.mul`) loading
//!
//! The overlay is parsed once per client and shared by every
//! [`FileIndex`](crate::FileIndex) through an `Arc`. Only the header table is
//! read up front; payloads are read on demand by offset.

use crate::{Result, paths};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uomul_formats::MulFormat;
use uomul_formats::verdata::{PATCH_ENTRY_SIZE, PatchTable};

/// Loaded patch overlay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdata {
    path: Option<PathBuf>,
    table: PatchTable,
}

impl Verdata {
    /// An overlay with no backing file and no patches
    pub fn empty() -> Self {
        Self::default()
    }

    /// Overlay from an already parsed table
    pub fn with_table(path: Option<PathBuf>, table: PatchTable) -> Self {
        Self { path, table }
    }

    /// Open `file_name` in `dir`, ignoring case
    ///
    /// A missing file yields an empty overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or its header
    /// table is malformed.
    pub fn open(dir: &Path, file_name: &str) -> Result<Self> {
        let Some(path) = paths::resolve(dir, file_name) else {
            debug!("No patch overlay {} in {}", file_name, dir.display());
            return Ok(Self::empty());
        };

        let mut file = File::open(&path)?;
        let mut header = [0u8; 4];
        let read = read_up_to(&mut file, &mut header)?;
        let mut table_bytes = header[..read].to_vec();

        if read == header.len() {
            // A negative count is left for the table parser to reject
            let count = usize::try_from(i32::from_le_bytes(header)).unwrap_or(0);
            let wanted = count.saturating_mul(PATCH_ENTRY_SIZE) as u64;
            file.take(wanted).read_to_end(&mut table_bytes)?;
        }

        let table = PatchTable::parse(&table_bytes)?;
        info!("Loaded {} patches from {}", table.len(), path.display());

        Ok(Self {
            path: Some(path),
            table,
        })
    }

    /// Path of the overlay file, if one was found
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Parsed patch table
    pub fn table(&self) -> &PatchTable {
        &self.table
    }

    /// Current size of the overlay file
    pub fn file_size(&self) -> Option<u64> {
        self.path.as_deref().and_then(paths::file_size)
    }
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StorageError;
    use tempfile::TempDir;
    use uomul_formats::FormatError;
    use uomul_formats::verdata::PatchEntry;

    fn overlay_bytes(entries: Vec<PatchEntry>, payload: &[u8]) -> Vec<u8> {
        let mut data = PatchTable::new(entries).build().unwrap();
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_missing_overlay_is_empty() {
        let dir = TempDir::new().unwrap();
        let verdata = Verdata::open(dir.path(), "verdata.mul").unwrap();
        assert!(verdata.path().is_none());
        assert!(verdata.table().is_empty());
        assert_eq!(verdata.file_size(), None);
    }

    #[test]
    fn test_open_reads_header_only() {
        let dir = TempDir::new().unwrap();
        let entry = PatchEntry {
            file_id: 4,
            index: 2,
            lookup: 24,
            length: 3,
            extra: 0,
        };
        let bytes = overlay_bytes(vec![entry], b"abc");
        std::fs::write(dir.path().join("VerData.MUL"), &bytes).unwrap();

        let verdata = Verdata::open(dir.path(), "verdata.mul").unwrap();
        assert_eq!(verdata.table().entries(), &[entry]);
        assert_eq!(verdata.file_size(), Some(bytes.len() as u64));
    }

    #[test]
    fn test_malformed_overlay_propagates() {
        let dir = TempDir::new().unwrap();
        let mut bytes = 2i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; PATCH_ENTRY_SIZE]);
        std::fs::write(dir.path().join("verdata.mul"), &bytes).unwrap();

        let err = Verdata::open(dir.path(), "verdata.mul").unwrap_err();
        assert!(matches!(
            err,
            StorageError::Format(FormatError::Truncated { .. })
        ));

        std::fs::write(dir.path().join("verdata.mul"), (-1i32).to_le_bytes()).unwrap();
        let err = Verdata::open(dir.path(), "verdata.mul").unwrap_err();
        assert!(matches!(
            err,
            StorageError::Format(FormatError::InvalidCount { .. })
        ));
    }
}
