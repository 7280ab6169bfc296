//! Index/data pair access
//!
//! A [`FileIndex`] ties an index file (`artidx.mul`) to its data file
//! (`art.mul`) and, optionally, to the shared patch overlay. Every record is
//! bounds checked against the file it points into before any byte is read:
//!
//! - unpatched records must fit inside the data file
//! - patched records must fit inside the overlay file
//!
//! Records that fail either check are reported as unavailable rather than as
//! errors. Bulk consumers take a [`FileIndexSnapshot`] once and pass it to the
//! `*_in` methods, or open a [`FileIndexReader`] that also keeps the backing
//! files open between reads.

mod integrity;
mod reader;

pub use integrity::IntegrityReport;
pub use reader::FileIndexReader;
pub(crate) use reader::Handle;

use crate::verdata::Verdata;
use crate::{Result, paths};
use binrw::BinReaderExt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};
use uomul_formats::idx::{self, INDEX_RECORD_SIZE, IndexRecord};

/// File a record's payload lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordSource {
    /// The paired data file
    Data,
    /// The patch overlay
    Overlay,
}

/// Resolved position of a readable record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLocation {
    /// Backing file
    pub source: RecordSource,
    /// Byte offset inside the backing file
    pub offset: u64,
    /// Payload length in bytes
    pub length: usize,
    /// Asset-specific extra value
    pub extra: i32,
}

impl RecordLocation {
    /// Whether the payload comes from the patch overlay
    pub fn is_patched(&self) -> bool {
        self.source == RecordSource::Overlay
    }
}

/// Payload bytes together with their index metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Payload bytes
    pub data: Vec<u8>,
    /// Asset-specific extra value
    pub extra: i32,
    /// Whether the payload came from the patch overlay
    pub patched: bool,
}

/// Patched index records plus the backing file sizes at snapshot time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndexSnapshot {
    /// Index records with patches applied
    pub entries: Vec<IndexRecord>,
    /// Size of the data file, `None` when missing
    pub data_file_size: Option<u64>,
    /// Size of the overlay file, `None` when missing or not configured
    pub overlay_file_size: Option<u64>,
}

impl FileIndexSnapshot {
    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no records
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accessor for one index/data pair
#[derive(Debug, Clone)]
pub struct FileIndex {
    index_path: PathBuf,
    data_path: PathBuf,
    overlay: Option<Arc<Verdata>>,
    file_id: Option<i32>,
}

impl FileIndex {
    /// Create an accessor without a patch overlay
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(index_path: P, data_path: Q) -> Self {
        Self {
            index_path: index_path.as_ref().to_path_buf(),
            data_path: data_path.as_ref().to_path_buf(),
            overlay: None,
            file_id: None,
        }
    }

    /// Attach a patch overlay and the file id this pair's patches carry
    #[must_use]
    pub fn with_overlay(mut self, overlay: Arc<Verdata>, file_id: Option<i32>) -> Self {
        self.overlay = Some(overlay);
        self.file_id = file_id;
        self
    }

    /// Path of the index file
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Path of the data file
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Attached overlay
    pub fn overlay(&self) -> Option<&Arc<Verdata>> {
        self.overlay.as_ref()
    }

    /// File id used to select patches
    pub fn file_id(&self) -> Option<i32> {
        self.file_id
    }

    /// Load every index record and apply matching patches
    ///
    /// A missing index file yields no records.
    ///
    /// # Errors
    ///
    /// Returns an error if the index file cannot be read or its length is
    /// not a multiple of 12 bytes.
    pub fn load(&self) -> Result<Vec<IndexRecord>> {
        let file = match File::open(&self.index_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Index file {} not found", self.index_path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = idx::decode_all(BufReader::new(file))?;
        if let Some((overlay, file_id)) = self.patch_source() {
            let applied = overlay.table().apply(file_id, &mut entries);
            debug!(
                "Loaded {} records from {} ({} patched)",
                entries.len(),
                self.index_path.display(),
                applied
            );
        } else {
            debug!(
                "Loaded {} records from {}",
                entries.len(),
                self.index_path.display()
            );
        }
        Ok(entries)
    }

    /// Load the records and probe both backing file sizes
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`FileIndex::load`].
    pub fn snapshot(&self) -> Result<FileIndexSnapshot> {
        Ok(FileIndexSnapshot {
            entries: self.load()?,
            data_file_size: self.data_file_size(),
            overlay_file_size: self.overlay_file_size(),
        })
    }

    /// Number of records, from the index file size alone
    pub fn entry_count(&self) -> usize {
        paths::file_size(&self.index_path)
            .and_then(|size| usize::try_from(size).ok())
            .map_or(0, |size| size / INDEX_RECORD_SIZE)
    }

    /// Current size of the data file
    pub fn data_file_size(&self) -> Option<u64> {
        paths::file_size(&self.data_path)
    }

    /// Current size of the overlay file
    pub fn overlay_file_size(&self) -> Option<u64> {
        self.overlay.as_ref().and_then(|o| o.file_size())
    }

    /// Whether `records[index]` is readable, probing file sizes now
    pub fn valid(&self, index: usize, records: &[IndexRecord]) -> bool {
        records.get(index).is_some_and(|record| {
            locate_record(record, self.data_file_size(), self.overlay_file_size()).is_some()
        })
    }

    /// Whether record `index` of a snapshot is readable
    pub fn valid_in(&self, snapshot: &FileIndexSnapshot, index: usize) -> bool {
        self.locate(snapshot, index).is_some()
    }

    /// Resolve record `index` of a snapshot to its backing file
    pub fn locate(&self, snapshot: &FileIndexSnapshot, index: usize) -> Option<RecordLocation> {
        let record = snapshot.entries.get(index)?;
        locate_record(
            record,
            snapshot.data_file_size,
            snapshot.overlay_file_size,
        )
    }

    /// Read the payload of record `index`
    ///
    /// Only the one 12-byte index record is read, so this is cheap for
    /// single lookups. Use a snapshot or a reader for bulk access.
    pub fn read(&self, index: usize) -> Option<Vec<u8>> {
        self.read_record(index).map(|r| r.data)
    }

    /// Read the payload of record `index` with its metadata
    pub fn read_record(&self, index: usize) -> Option<RawRecord> {
        let record = self.record_at(index)?;
        let location = locate_record(&record, self.data_file_size(), self.overlay_file_size())?;
        let mut file = self.open_source(location.source)?;
        self.read_located(&mut file, &location, index)
    }

    /// Read the payload of record `index` of a snapshot
    pub fn read_in(&self, snapshot: &FileIndexSnapshot, index: usize) -> Option<Vec<u8>> {
        self.read_record_in(snapshot, index).map(|r| r.data)
    }

    /// Read record `index` of a snapshot with its metadata
    pub fn read_record_in(&self, snapshot: &FileIndexSnapshot, index: usize) -> Option<RawRecord> {
        let location = self.locate(snapshot, index)?;
        let mut file = self.open_source(location.source)?;
        self.read_located(&mut file, &location, index)
    }

    /// Open a reader session over a fresh snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be taken.
    pub fn open_reader(&self) -> Result<FileIndexReader<'_>> {
        Ok(FileIndexReader::new(self, self.snapshot()?))
    }

    /// Open a reader session over an existing snapshot
    pub fn reader_with(&self, snapshot: FileIndexSnapshot) -> FileIndexReader<'_> {
        FileIndexReader::new(self, snapshot)
    }

    /// Classify every record of a snapshot
    pub fn scan_integrity(&self, snapshot: &FileIndexSnapshot) -> IntegrityReport {
        let report = IntegrityReport::scan(snapshot);
        info!(
            "Integrity of {}: {} valid, {} invalid, {} empty",
            self.index_path.display(),
            report.valid,
            report.invalid,
            report.empty
        );
        report
    }

    /// Indices of readable records in `[start, end)`, ascending, at most `limit`
    pub fn iter_valid_indices<'a>(
        &'a self,
        snapshot: &'a FileIndexSnapshot,
        start: usize,
        end: Option<usize>,
        limit: Option<usize>,
    ) -> ValidIndices<'a> {
        let end = end.map_or(snapshot.len(), |e| e.min(snapshot.len()));
        ValidIndices {
            index: self,
            snapshot,
            next: start,
            end,
            remaining: limit,
        }
    }

    /// First readable record in `[start, end)`
    pub fn first_valid_index(
        &self,
        snapshot: &FileIndexSnapshot,
        start: usize,
        end: Option<usize>,
    ) -> Option<usize> {
        self.iter_valid_indices(snapshot, start, end, Some(1)).next()
    }

    fn patch_source(&self) -> Option<(&Verdata, i32)> {
        let overlay = self.overlay.as_deref()?;
        let file_id = self.file_id?;
        (!overlay.table().is_empty()).then_some((overlay, file_id))
    }

    fn overlay_path(&self) -> Option<&Path> {
        self.overlay.as_deref().and_then(Verdata::path)
    }

    /// Single index record with its patch applied
    fn record_at(&self, index: usize) -> Option<IndexRecord> {
        let start = index.checked_mul(INDEX_RECORD_SIZE)? as u64;
        let size = paths::file_size(&self.index_path)?;
        if start + INDEX_RECORD_SIZE as u64 > size {
            return None;
        }

        let mut record = match File::open(&self.index_path).and_then(|mut file| {
            file.seek(SeekFrom::Start(start))?;
            file.read_le::<IndexRecord>()
                .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e.to_string()))
        }) {
            Ok(record) => record,
            Err(e) => {
                debug!(
                    "Failed to read record {} of {}: {}",
                    index,
                    self.index_path.display(),
                    e
                );
                return None;
            }
        };

        if let Some((overlay, file_id)) = self.patch_source() {
            if let Some(patch) = i32::try_from(index)
                .ok()
                .and_then(|slot| overlay.table().lookup(file_id, slot))
            {
                record = patch.to_index_record();
            }
        }
        Some(record)
    }

    pub(crate) fn open_source(&self, source: RecordSource) -> Option<File> {
        let path = match source {
            RecordSource::Data => self.data_path.as_path(),
            RecordSource::Overlay => self.overlay_path()?,
        };
        match File::open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!("Failed to open {}: {}", path.display(), e);
                None
            }
        }
    }

    pub(crate) fn read_located(
        &self,
        file: &mut File,
        location: &RecordLocation,
        index: usize,
    ) -> Option<RawRecord> {
        let mut data = vec![0u8; location.length];
        let result = file
            .seek(SeekFrom::Start(location.offset))
            .and_then(|_| file.read_exact(&mut data));
        if let Err(e) = result {
            debug!(
                "Failed to read record {} of {}: {}",
                index,
                self.index_path.display(),
                e
            );
            return None;
        }
        trace!(
            "Read record {} ({} bytes, {:?})",
            index, location.length, location.source
        );
        Some(RawRecord {
            data,
            extra: location.extra,
            patched: location.is_patched(),
        })
    }
}

/// Two-tier bounds check shared by every read path
pub(crate) fn locate_record(
    record: &IndexRecord,
    data_size: Option<u64>,
    overlay_size: Option<u64>,
) -> Option<RecordLocation> {
    let (start, end) = record.byte_range()?;
    let (source, size) = if record.is_patched() {
        (RecordSource::Overlay, overlay_size?)
    } else {
        (RecordSource::Data, data_size?)
    };
    if end > size {
        return None;
    }
    Some(RecordLocation {
        source,
        offset: start,
        length: usize::try_from(end - start).ok()?,
        extra: record.extra,
    })
}

/// Iterator over readable record indices
///
/// Cloning restarts from the clone point without touching the files.
#[derive(Debug, Clone)]
pub struct ValidIndices<'a> {
    index: &'a FileIndex,
    snapshot: &'a FileIndexSnapshot,
    next: usize,
    end: usize,
    remaining: Option<usize>,
}

impl Iterator for ValidIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == Some(0) {
            return None;
        }
        while self.next < self.end {
            let current = self.next;
            self.next += 1;
            if self.index.valid_in(self.snapshot, current) {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
                return Some(current);
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_locate_record_bounds() {
        let data = Some(16);
        let overlay = Some(100);

        let located = locate_record(&IndexRecord::new(4, 4, 7), data, overlay).unwrap();
        assert_eq!(located.source, RecordSource::Data);
        assert_eq!((located.offset, located.length, located.extra), (4, 4, 7));
        assert!(!located.is_patched());

        // Exactly at the end of the file
        assert!(locate_record(&IndexRecord::new(12, 4, 0), data, overlay).is_some());
        assert!(locate_record(&IndexRecord::new(14, 4, 0), data, overlay).is_none());
        assert!(locate_record(&IndexRecord::EMPTY, data, overlay).is_none());
        assert!(locate_record(&IndexRecord::new(0, 4, 0), None, overlay).is_none());

        let patched = IndexRecord::patched(90, 10, 1);
        assert!(locate_record(&patched, data, overlay).unwrap().is_patched());
        assert!(locate_record(&patched, data, None).is_none());
        assert!(locate_record(&IndexRecord::patched(91, 10, 1), data, overlay).is_none());
    }

    #[test]
    fn test_valid_indices_respects_window_and_limit() {
        let fi = FileIndex::new("unused.idx", "unused.mul");
        let snapshot = FileIndexSnapshot {
            entries: vec![
                IndexRecord::new(0, 1, 0),
                IndexRecord::EMPTY,
                IndexRecord::new(1, 1, 0),
                IndexRecord::new(2, 1, 0),
                IndexRecord::new(3, 1, 0),
            ],
            data_file_size: Some(4),
            overlay_file_size: None,
        };

        let all: Vec<_> = fi.iter_valid_indices(&snapshot, 0, None, None).collect();
        assert_eq!(all, vec![0, 2, 3, 4]);

        let window: Vec<_> = fi.iter_valid_indices(&snapshot, 1, Some(4), None).collect();
        assert_eq!(window, vec![2, 3]);

        let mut limited = fi.iter_valid_indices(&snapshot, 0, Some(99), Some(2));
        assert_eq!(limited.next(), Some(0));
        let restart = limited.clone();
        assert_eq!(limited.collect::<Vec<_>>(), vec![2]);
        assert_eq!(restart.collect::<Vec<_>>(), vec![2]);

        assert_eq!(fi.first_valid_index(&snapshot, 1, None), Some(2));
        assert_eq!(fi.first_valid_index(&snapshot, 5, None), None);
        assert_eq!(fi.iter_valid_indices(&snapshot, 0, None, Some(0)).count(), 0);
    }
}
