//! Keyed record stores
//!
//! An [`AssetStore`] maps `(asset, index)` to payload bytes and never fails:
//! missing files, empty slots and I/O errors all come back as `None`. Three
//! implementations are provided:
//!
//! - [`MulIdxStore`]: one lazily built [`FileIndex`] per asset
//! - [`MmapStore`]: memory-mapped data files with cached index records
//! - [`CachedStore`]: an LRU layer over any other store
//!
//! Stores fill their caches behind `parking_lot` mutexes so they can be shared
//! by reference.

use crate::client::ClientFiles;
use crate::file_index::{FileIndex, FileIndexSnapshot, RecordSource};
use lru::LruCache;
use memmap2::{Mmap, MmapOptions};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Source of raw record bytes keyed by asset name and index
pub trait AssetStore {
    /// Payload of record `index` of `asset`, `None` when unavailable
    fn get_entry(&self, asset: &str, index: usize) -> Option<Vec<u8>>;
}

impl<S: AssetStore + ?Sized> AssetStore for &S {
    fn get_entry(&self, asset: &str, index: usize) -> Option<Vec<u8>> {
        (**self).get_entry(asset, index)
    }
}

impl<S: AssetStore + ?Sized> AssetStore for Arc<S> {
    fn get_entry(&self, asset: &str, index: usize) -> Option<Vec<u8>> {
        (**self).get_entry(asset, index)
    }
}

/// Store reading through one [`FileIndex`] per asset
#[derive(Debug)]
pub struct MulIdxStore {
    files: ClientFiles,
    indices: Mutex<HashMap<String, Arc<FileIndex>>>,
}

impl MulIdxStore {
    /// Create a store over a client installation
    pub fn new(files: ClientFiles) -> Self {
        Self {
            files,
            indices: Mutex::new(HashMap::new()),
        }
    }

    fn file_index(&self, asset: &str) -> Arc<FileIndex> {
        let key = asset.to_ascii_lowercase();
        let mut indices = self.indices.lock();
        Arc::clone(
            indices
                .entry(key)
                .or_insert_with(|| Arc::new(self.files.file_index(asset))),
        )
    }
}

impl AssetStore for MulIdxStore {
    fn get_entry(&self, asset: &str, index: usize) -> Option<Vec<u8>> {
        self.file_index(asset).read(index)
    }
}

/// Per-asset state of an [`MmapStore`]
#[derive(Debug)]
struct MappedAsset {
    index: FileIndex,
    snapshot: Option<FileIndexSnapshot>,
    data: Option<Mmap>,
}

impl MappedAsset {
    fn open(index: FileIndex) -> Self {
        let snapshot = match index.snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(
                    "Failed to load index {}: {}",
                    index.index_path().display(),
                    e
                );
                None
            }
        };
        let data = map_file(&index);
        Self {
            index,
            snapshot,
            data,
        }
    }

    fn read(&self, record: usize) -> Option<Vec<u8>> {
        let snapshot = self.snapshot.as_ref()?;
        let location = self.index.locate(snapshot, record)?;

        match (location.source, self.data.as_ref()) {
            (RecordSource::Data, Some(mmap)) => {
                let start = usize::try_from(location.offset).ok()?;
                let bytes = mmap.get(start..start.checked_add(location.length)?)?;
                trace!("Mapped record {} ({} bytes)", record, bytes.len());
                Some(bytes.to_vec())
            }
            // Patched records and unmappable data files go through the index
            _ => self.index.read_in(snapshot, record),
        }
    }
}

fn map_file(index: &FileIndex) -> Option<Mmap> {
    let path = index.data_path();
    // Zero-length files cannot be mapped on every platform
    if index.data_file_size().unwrap_or(0) == 0 {
        return None;
    }
    let file = File::open(path).ok()?;

    #[allow(unsafe_code)]
    let mmap = unsafe { MmapOptions::new().map(&file) };
    match mmap {
        Ok(mmap) => {
            debug!("Mapped {} ({} bytes)", path.display(), mmap.len());
            Some(mmap)
        }
        Err(e) => {
            warn!("Failed to mmap {}: {}", path.display(), e);
            None
        }
    }
}

/// Store slicing unpatched records out of memory-mapped data files
///
/// Index records are loaded once per asset. Patched records fall back to
/// reading the overlay through the [`FileIndex`].
#[derive(Debug)]
pub struct MmapStore {
    files: ClientFiles,
    assets: Mutex<HashMap<String, Arc<MappedAsset>>>,
}

impl MmapStore {
    /// Create a store over a client installation
    pub fn new(files: ClientFiles) -> Self {
        Self {
            files,
            assets: Mutex::new(HashMap::new()),
        }
    }

    fn asset(&self, asset: &str) -> Arc<MappedAsset> {
        let key = asset.to_ascii_lowercase();
        let mut assets = self.assets.lock();
        Arc::clone(
            assets
                .entry(key)
                .or_insert_with(|| Arc::new(MappedAsset::open(self.files.file_index(asset)))),
        )
    }
}

impl AssetStore for MmapStore {
    fn get_entry(&self, asset: &str, index: usize) -> Option<Vec<u8>> {
        self.asset(asset).read(index)
    }
}

/// Hit and occupancy counters of a [`CachedStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups forwarded to the inner store
    pub misses: u64,
    /// Records currently cached
    pub entries: usize,
    /// Payload bytes currently cached
    pub bytes: usize,
}

type CacheKey = (String, usize);

struct LruState {
    records: LruCache<CacheKey, Arc<[u8]>>,
    bytes: usize,
    hits: u64,
    misses: u64,
}

impl LruState {
    fn new() -> Self {
        Self {
            records: LruCache::unbounded(),
            bytes: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn insert(&mut self, key: CacheKey, data: Arc<[u8]>) {
        self.bytes += data.len();
        if let Some(old) = self.records.put(key, data) {
            self.bytes -= old.len();
        }
    }

    fn evict(&mut self, max_entries: usize, max_bytes: usize) {
        while self.records.len() > max_entries || self.bytes > max_bytes {
            let Some((key, data)) = self.records.pop_lru() else {
                break;
            };
            self.bytes -= data.len();
            trace!("Evicted {}#{} ({} bytes)", key.0, key.1, data.len());
        }
    }
}

impl std::fmt::Debug for LruState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruState")
            .field("entries", &self.records.len())
            .field("bytes", &self.bytes)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

/// LRU cache over another store
///
/// Bounded by both record count and total payload bytes; the least recently
/// used records are evicted until both limits hold. Unavailable records are
/// not cached, so a record that appears later is picked up.
#[derive(Debug)]
pub struct CachedStore<S> {
    inner: S,
    max_entries: usize,
    max_bytes: usize,
    state: Mutex<LruState>,
}

impl<S: AssetStore> CachedStore<S> {
    /// Default record limit
    pub const DEFAULT_MAX_ENTRIES: usize = 1024;

    /// Default byte limit
    pub const DEFAULT_MAX_BYTES: usize = 256 * 1024 * 1024;

    /// Wrap `inner` with the default limits
    pub fn new(inner: S) -> Self {
        Self::with_limits(inner, Self::DEFAULT_MAX_ENTRIES, Self::DEFAULT_MAX_BYTES)
    }

    /// Wrap `inner` with explicit limits
    pub fn with_limits(inner: S, max_entries: usize, max_bytes: usize) -> Self {
        Self {
            inner,
            max_entries,
            max_bytes,
            state: Mutex::new(LruState::new()),
        }
    }

    /// Wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.records.len(),
            bytes: state.bytes,
        }
    }

    /// Drop every cached record
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.bytes = 0;
    }
}

impl<S: AssetStore> AssetStore for CachedStore<S> {
    fn get_entry(&self, asset: &str, index: usize) -> Option<Vec<u8>> {
        let key = (asset.to_string(), index);
        {
            let mut state = self.state.lock();
            if let Some(data) = state.records.get(&key).map(Arc::clone) {
                state.hits += 1;
                return Some(data.to_vec());
            }
            state.misses += 1;
        }

        // The inner read happens without holding the lock
        let data = self.inner.get_entry(asset, index)?;
        let mut state = self.state.lock();
        state.insert(key, Arc::from(data.as_slice()));
        state.evict(self.max_entries, self.max_bytes);
        Some(data)
    }
}
