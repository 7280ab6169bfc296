//! Bulk reader session

use super::{FileIndex, FileIndexSnapshot, RawRecord, RecordSource};
use std::fs::File;

/// Lazily opened file handle
///
/// A failed open is remembered, so a missing file is probed only once.
#[derive(Debug, Default)]
pub(crate) enum Handle {
    #[default]
    Unopened,
    Open(File),
    Unavailable,
}

impl Handle {
    pub(crate) fn get_or_open(&mut self, open: impl FnOnce() -> Option<File>) -> Option<&mut File> {
        if matches!(self, Self::Unopened) {
            *self = open().map_or(Self::Unavailable, Self::Open);
        }
        match self {
            Self::Open(file) => Some(file),
            Self::Unopened | Self::Unavailable => None,
        }
    }

    pub(crate) const fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// Reader over a fixed snapshot that keeps its backing files open
///
/// Each backing file is opened on first use, at most once per session, and
/// closed when the reader is dropped.
#[derive(Debug)]
pub struct FileIndexReader<'a> {
    index: &'a FileIndex,
    snapshot: FileIndexSnapshot,
    data: Handle,
    overlay: Handle,
}

impl<'a> FileIndexReader<'a> {
    pub(crate) fn new(index: &'a FileIndex, snapshot: FileIndexSnapshot) -> Self {
        Self {
            index,
            snapshot,
            data: Handle::Unopened,
            overlay: Handle::Unopened,
        }
    }

    /// Snapshot the session reads from
    pub fn snapshot(&self) -> &FileIndexSnapshot {
        &self.snapshot
    }

    /// Read the payload of record `index`
    pub fn read(&mut self, index: usize) -> Option<Vec<u8>> {
        self.read_record(index).map(|r| r.data)
    }

    /// Read record `index` with its metadata
    pub fn read_record(&mut self, index: usize) -> Option<RawRecord> {
        let location = self.index.locate(&self.snapshot, index)?;
        let handle = match location.source {
            RecordSource::Data => &mut self.data,
            RecordSource::Overlay => &mut self.overlay,
        };
        let index_file = self.index;
        let file = handle.get_or_open(|| index_file.open_source(location.source))?;
        self.index.read_located(file, &location, index)
    }

    /// Whether any backing file is currently open
    pub fn has_open_handles(&self) -> bool {
        self.data.is_open() || self.overlay.is_open()
    }
}
