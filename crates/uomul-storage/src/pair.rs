//! Writable index/data pairs
//!
//! [`MulPair`] is the write path used by the asset importers. Payloads are
//! only ever appended to the data file; replacing a record points its index
//! slot at the new bytes and leaves the old ones in place. The caller
//! persists the updated records with [`MulPair::save_index`].
//!
//! Writes are not atomic and concurrent writers must serialize externally.

use crate::{Result, StorageError};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uomul_formats::EncodeError;
use uomul_formats::idx::{self, IndexRecord};

/// Raw index/data pair without patch overlay handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulPair {
    data_path: PathBuf,
    index_path: PathBuf,
}

impl MulPair {
    /// Create a pair from its two paths
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(data_path: P, index_path: Q) -> Self {
        Self {
            data_path: data_path.as_ref().to_path_buf(),
            index_path: index_path.as_ref().to_path_buf(),
        }
    }

    /// Path of the data file
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Path of the index file
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Load the index records; a missing index yields none
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read or is truncated.
    pub fn load_index(&self) -> Result<Vec<IndexRecord>> {
        match File::open(&self.index_path) {
            Ok(file) => Ok(idx::decode_all(BufReader::new(file))?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the index file with `records`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_index(&self, records: &[IndexRecord]) -> Result<()> {
        create_parent(&self.index_path)?;
        let mut writer = BufWriter::new(File::create(&self.index_path)?);
        idx::write_all(&mut writer, records)?;
        writer.flush()?;
        debug!(
            "Saved {} records to {}",
            records.len(),
            self.index_path.display()
        );
        Ok(())
    }

    /// Read the payload of `records[index]` from the data file
    ///
    /// Returns `None` for empty records.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexOutOfRange`] if `index` is not a slot of
    /// `records`, or an I/O error if the payload cannot be read.
    pub fn read_raw(&self, index: usize, records: &[IndexRecord]) -> Result<Option<Vec<u8>>> {
        let record = records.get(index).ok_or(StorageError::IndexOutOfRange {
            index,
            count: records.len(),
        })?;
        let Some((start, end)) = record.byte_range() else {
            return Ok(None);
        };

        let mut file = File::open(&self.data_path)?;
        file.seek(SeekFrom::Start(start))?;
        let mut data = Vec::new();
        file.take(end - start).read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Append `payload` to the data file and point a slot at it
    ///
    /// With `index` set, `records` grows with empty `(-1, -1, 0)` slots up to
    /// that index and the slot is overwritten. Otherwise a new slot is
    /// appended. Returns the slot written.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file cannot be written or the resulting
    /// offset or length does not fit an index record.
    pub fn append_raw(
        &self,
        payload: &[u8],
        extra: i32,
        index: Option<usize>,
        records: &mut Vec<IndexRecord>,
    ) -> Result<usize> {
        let length = i32::try_from(payload.len()).map_err(|_| EncodeError::TooLarge {
            context: "record payload",
            size: payload.len(),
            limit: i32::MAX as usize,
        })?;

        create_parent(&self.data_path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.data_path)?;
        let offset = file.seek(SeekFrom::End(0))?;
        let offset = i32::try_from(offset).map_err(|_| EncodeError::TooLarge {
            context: "data file offset",
            size: usize::try_from(offset).unwrap_or(usize::MAX),
            limit: i32::MAX as usize,
        })?;
        file.write_all(payload)?;
        file.flush()?;

        let record = IndexRecord::new(offset, length, extra);
        let slot = match index {
            None => {
                records.push(record);
                records.len() - 1
            }
            Some(slot) => {
                if slot >= records.len() {
                    records.resize(slot + 1, IndexRecord::EMPTY);
                }
                records[slot] = record;
                slot
            }
        };

        debug!(
            "Appended {} bytes at {} of {} for slot {}",
            payload.len(),
            offset,
            self.data_path.display(),
            slot
        );
        Ok(slot)
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let pair = MulPair::new(
            dir.path().join("out/test.mul"),
            dir.path().join("out/testidx.mul"),
        );

        let mut records = pair.load_index().unwrap();
        assert!(records.is_empty());

        assert_eq!(pair.append_raw(b"abcd", 7, None, &mut records).unwrap(), 0);
        assert_eq!(pair.append_raw(b"xy", 0, Some(3), &mut records).unwrap(), 3);
        assert_eq!(
            records,
            vec![
                IndexRecord::new(0, 4, 7),
                IndexRecord::EMPTY,
                IndexRecord::EMPTY,
                IndexRecord::new(4, 2, 0),
            ]
        );

        pair.save_index(&records).unwrap();
        let reloaded = pair.load_index().unwrap();
        assert_eq!(reloaded, records);

        assert_eq!(pair.read_raw(0, &reloaded).unwrap(), Some(b"abcd".to_vec()));
        assert_eq!(pair.read_raw(1, &reloaded).unwrap(), None);
        assert_eq!(pair.read_raw(3, &reloaded).unwrap(), Some(b"xy".to_vec()));
        assert!(matches!(
            pair.read_raw(4, &reloaded),
            Err(StorageError::IndexOutOfRange { index: 4, count: 4 })
        ));
    }

    #[test]
    fn test_replace_keeps_old_bytes() {
        let dir = TempDir::new().unwrap();
        let pair = MulPair::new(dir.path().join("a.mul"), dir.path().join("aidx.mul"));
        let mut records = Vec::new();

        pair.append_raw(b"old", 0, Some(0), &mut records).unwrap();
        pair.append_raw(b"newer", 1, Some(0), &mut records).unwrap();

        assert_eq!(records, vec![IndexRecord::new(3, 5, 1)]);
        assert_eq!(fs::read(pair.data_path()).unwrap(), b"oldnewer");
        assert_eq!(pair.read_raw(0, &records).unwrap(), Some(b"newer".to_vec()));
    }
}
