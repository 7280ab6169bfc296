//! Facet land and statics (`map{n}.mul`, `statics{n}.mul`, `staidx{n}.mul`)
//!
//! Land is a flat array of 196-byte blocks addressed by block number
//! `x * block_height + y`. Statics are an ordinary index/data pair using the
//! same block number as their index slot. Neither file is patched by the
//! overlay.

use crate::file_index::Handle;
use crate::pair::MulPair;
use crate::{Result, StorageError, paths};
use binrw::BinReaderExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uomul_formats::idx::{INDEX_RECORD_SIZE, IndexRecord};
use uomul_formats::map::{
    MAP_BLOCK_SIZE, MapBlock, MapDefinition, StaticTile, decode_map_block, decode_static_block,
    encode_map_block, encode_static_block,
};

/// Inclusive rectangle of block coordinates
///
/// Coordinates are signed so callers can pass rectangles that hang off the
/// facet; [`MapFiles::clamp_rect`] trims them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRect {
    /// First column
    pub min_x: i32,
    /// First row
    pub min_y: i32,
    /// Last column, inclusive
    pub max_x: i32,
    /// Last row, inclusive
    pub max_y: i32,
}

impl BlockRect {
    /// Rectangle from two corners
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether the rectangle covers no block
    pub const fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

/// Land and statics of one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapBlockData {
    /// Block column
    pub x: u32,
    /// Block row
    pub y: u32,
    /// Land cells
    pub land: MapBlock,
    /// Statics placed in the block
    pub statics: Vec<StaticTile>,
}

/// One facet's files
#[derive(Debug, Clone)]
pub struct MapFiles {
    definition: MapDefinition,
    map_path: PathBuf,
    statics: MulPair,
}

impl MapFiles {
    /// Facet `map_id` with its land file and statics pair
    pub fn new<P: AsRef<Path>>(map_id: u8, map_path: P, statics: MulPair) -> Self {
        Self {
            definition: MapDefinition::for_id(map_id),
            map_path: map_path.as_ref().to_path_buf(),
            statics,
        }
    }

    /// Override the facet size
    #[must_use]
    pub fn with_definition(mut self, definition: MapDefinition) -> Self {
        self.definition = definition;
        self
    }

    /// Facet size
    pub fn definition(&self) -> &MapDefinition {
        &self.definition
    }

    /// Width in blocks
    pub fn block_width(&self) -> u32 {
        self.definition.block_width()
    }

    /// Height in blocks
    pub fn block_height(&self) -> u32 {
        self.definition.block_height()
    }

    /// Whether a block lies on the facet
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        self.definition.in_bounds(x, y)
    }

    /// Path of the land file
    pub fn map_path(&self) -> &Path {
        &self.map_path
    }

    /// Statics pair
    pub fn statics_pair(&self) -> &MulPair {
        &self.statics
    }

    /// Trim `rect` to the facet
    pub fn clamp_rect(&self, rect: BlockRect) -> BlockRect {
        let max_x = i32::try_from(self.block_width()).unwrap_or(i32::MAX) - 1;
        let max_y = i32::try_from(self.block_height()).unwrap_or(i32::MAX) - 1;
        BlockRect {
            min_x: rect.min_x.max(0),
            min_y: rect.min_y.max(0),
            max_x: rect.max_x.min(max_x),
            max_y: rect.max_y.min(max_y),
        }
    }

    /// Block coordinates in `rect`, or the whole facet, column by column
    pub fn block_coords(&self, rect: Option<BlockRect>) -> impl Iterator<Item = (u32, u32)> {
        let full = BlockRect::new(0, 0, i32::MAX, i32::MAX);
        let rect = self.clamp_rect(rect.unwrap_or(full));
        let (xs, ys) = if rect.is_empty() {
            (0..0, 0..0)
        } else {
            (
                rect.min_x.unsigned_abs()..rect.max_x.unsigned_abs() + 1,
                rect.min_y.unsigned_abs()..rect.max_y.unsigned_abs() + 1,
            )
        };
        xs.flat_map(move |x| ys.clone().map(move |y| (x, y)))
    }

    /// Open a reader session that keeps the land, index and statics files
    /// open across block reads
    pub fn reader(&self) -> MapReader<'_> {
        MapReader {
            files: self,
            land: Handle::Unopened,
            index: Handle::Unopened,
            index_size: paths::file_size(self.statics.index_path()),
            statics: Handle::Unopened,
        }
    }

    /// Land block at `(x, y)`
    ///
    /// `None` when the block is off the facet, the land file is missing or
    /// too short.
    pub fn land_block(&self, x: u32, y: u32) -> Result<Option<MapBlock>> {
        self.reader().land_block(x, y)
    }

    /// Statics of block `(x, y)`
    ///
    /// Blocks off the facet, without an index slot or whose payload cannot
    /// be read have no statics.
    pub fn static_block(&self, x: u32, y: u32) -> Result<Vec<StaticTile>> {
        self.reader().static_block(x, y)
    }

    /// Land and statics of block `(x, y)`
    pub fn block(&self, x: u32, y: u32) -> Result<Option<MapBlockData>> {
        self.reader().block(x, y)
    }

    /// Every readable block in `rect`, or the whole facet
    ///
    /// All blocks are read through a single [`MapReader`].
    pub fn blocks(&self, rect: Option<BlockRect>) -> Result<Vec<MapBlockData>> {
        let mut reader = self.reader();
        let mut blocks = Vec::new();
        for (x, y) in self.block_coords(rect) {
            if let Some(block) = reader.block(x, y)? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// Overwrite land block `(x, y)` in place, growing the file as needed
    pub fn write_land_block(&self, x: u32, y: u32, block: &MapBlock) -> Result<()> {
        self.check_bounds(x, y)?;
        let payload = encode_map_block(block)?;
        if let Some(parent) = self.map_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.map_path)?;
        file.seek(SeekFrom::Start(self.definition.block_offset(x, y)))?;
        file.write_all(&payload)?;
        file.flush()?;
        debug!("Wrote land block ({}, {})", x, y);
        Ok(())
    }

    /// Replace the statics of block `(x, y)`
    ///
    /// An empty list clears the slot instead of appending an empty payload.
    pub fn import_static_block(&self, x: u32, y: u32, tiles: &[StaticTile]) -> Result<()> {
        self.check_bounds(x, y)?;
        let slot = usize::try_from(self.definition.block_index(x, y)).map_err(|_| {
            StorageError::Config(format!("block ({x}, {y}) has no addressable slot"))
        })?;
        let mut records = self.statics.load_index()?;
        if tiles.is_empty() {
            if slot >= records.len() {
                records.resize(slot + 1, IndexRecord::EMPTY);
            }
            records[slot] = IndexRecord::EMPTY;
        } else {
            let payload = encode_static_block(tiles)?;
            self.statics.append_raw(&payload, 0, Some(slot), &mut records)?;
        }
        self.statics.save_index(&records)?;
        info!(
            "Imported {} statics into block ({}, {})",
            tiles.len(),
            x,
            y
        );
        Ok(())
    }

    fn check_bounds(&self, x: u32, y: u32) -> Result<()> {
        if self.in_bounds(x, y) {
            return Ok(());
        }
        Err(StorageError::Config(format!(
            "block ({x}, {y}) is outside map {} ({}x{} blocks)",
            self.definition.id,
            self.block_width(),
            self.block_height()
        )))
    }
}

/// Bulk reader over one facet
///
/// Each of the three files is opened on first use and kept open until the
/// reader is dropped. The static index size is sampled when the session
/// starts.
#[derive(Debug)]
pub struct MapReader<'a> {
    files: &'a MapFiles,
    land: Handle,
    index: Handle,
    index_size: Option<u64>,
    statics: Handle,
}

impl MapReader<'_> {
    /// Land block at `(x, y)`, see [`MapFiles::land_block`]
    pub fn land_block(&mut self, x: u32, y: u32) -> Result<Option<MapBlock>> {
        if !self.files.in_bounds(x, y) {
            return Ok(None);
        }
        let offset = self.files.definition.block_offset(x, y);
        let map_path = self.files.map_path.as_path();
        let Some(file) = self.land.get_or_open(|| File::open(map_path).ok()) else {
            debug!("No land file {}", map_path.display());
            return Ok(None);
        };

        let mut raw = vec![0u8; MAP_BLOCK_SIZE];
        let read = file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut raw));
        if let Err(e) = read {
            debug!(
                "No land block ({}, {}) in {}: {}",
                x,
                y,
                map_path.display(),
                e
            );
            return Ok(None);
        }
        Ok(Some(decode_map_block(&raw)?))
    }

    /// Statics of block `(x, y)`, see [`MapFiles::static_block`]
    pub fn static_block(&mut self, x: u32, y: u32) -> Result<Vec<StaticTile>> {
        if !self.files.in_bounds(x, y) {
            return Ok(Vec::new());
        }
        let slot = self.files.definition.block_index(x, y);
        let Some(record) = self.static_record(slot) else {
            return Ok(Vec::new());
        };
        let Some((start, end)) = record.byte_range() else {
            return Ok(Vec::new());
        };

        let data_path = self.files.statics.data_path();
        let Some(file) = self.statics.get_or_open(|| File::open(data_path).ok()) else {
            debug!("No statics file {}", data_path.display());
            return Ok(Vec::new());
        };
        let mut raw = Vec::new();
        let read = file
            .seek(SeekFrom::Start(start))
            .and_then(|_| std::io::Read::by_ref(&mut *file).take(end - start).read_to_end(&mut raw));
        match read {
            Ok(n) if n as u64 == end - start => Ok(decode_static_block(&raw)?),
            Ok(n) => {
                debug!("Static block {} truncated ({} of {} bytes)", slot, n, end - start);
                Ok(Vec::new())
            }
            Err(e) => {
                debug!("Failed to read static block {}: {}", slot, e);
                Ok(Vec::new())
            }
        }
    }

    /// Land and statics of block `(x, y)`
    pub fn block(&mut self, x: u32, y: u32) -> Result<Option<MapBlockData>> {
        let Some(land) = self.land_block(x, y)? else {
            return Ok(None);
        };
        Ok(Some(MapBlockData {
            x,
            y,
            land,
            statics: self.static_block(x, y)?,
        }))
    }

    /// Whether any of the facet files is currently open
    pub fn has_open_handles(&self) -> bool {
        self.land.is_open() || self.index.is_open() || self.statics.is_open()
    }

    fn static_record(&mut self, slot: u64) -> Option<IndexRecord> {
        let start = slot.checked_mul(INDEX_RECORD_SIZE as u64)?;
        if start + INDEX_RECORD_SIZE as u64 > self.index_size? {
            return None;
        }
        let index_path = self.files.statics.index_path();
        let file = self.index.get_or_open(|| File::open(index_path).ok())?;
        let read = file
            .seek(SeekFrom::Start(start))
            .map_err(binrw::Error::Io)
            .and_then(|_| file.read_le::<IndexRecord>());
        match read {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Failed to read static index {}: {}", slot, e);
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use uomul_formats::map::MapTile;

    fn small_map(dir: &TempDir) -> MapFiles {
        MapFiles::new(
            0,
            dir.path().join("map0.mul"),
            MulPair::new(
                dir.path().join("statics0.mul"),
                dir.path().join("staidx0.mul"),
            ),
        )
        .with_definition(MapDefinition {
            id: 0,
            width: 32,
            height: 16,
        })
    }

    fn block_with(id: u16) -> MapBlock {
        MapBlock {
            header: 7,
            tiles: [MapTile { id, z: -5 }; 64],
        }
    }

    #[test]
    fn test_clamp_rect() {
        let dir = TempDir::new().unwrap();
        let map = small_map(&dir);
        assert_eq!(map.block_width(), 4);
        assert_eq!(map.block_height(), 2);

        let clamped = map.clamp_rect(BlockRect::new(-3, -1, 10, 1));
        assert_eq!(clamped, BlockRect::new(0, 0, 3, 1));

        let coords: Vec<_> = map.block_coords(Some(BlockRect::new(2, 0, 9, 9))).collect();
        assert_eq!(coords, vec![(2, 0), (2, 1), (3, 0), (3, 1)]);

        assert_eq!(map.block_coords(None).count(), 8);
        assert_eq!(
            map.block_coords(Some(BlockRect::new(5, 0, 9, 1))).count(),
            0
        );
    }

    #[test]
    fn test_missing_files_yield_nothing() {
        let dir = TempDir::new().unwrap();
        let map = small_map(&dir);
        assert!(map.land_block(0, 0).unwrap().is_none());
        assert!(map.static_block(0, 0).unwrap().is_empty());
        assert!(map.block(0, 0).unwrap().is_none());
        assert!(map.land_block(4, 0).unwrap().is_none());
    }

    #[test]
    fn test_land_and_statics_round_trip() {
        let dir = TempDir::new().unwrap();
        let map = small_map(&dir);

        // block (1, 1) is number 3; earlier blocks are zero-filled
        map.write_land_block(1, 1, &block_with(0x44)).unwrap();
        assert_eq!(
            std::fs::metadata(map.map_path()).unwrap().len(),
            4 * MAP_BLOCK_SIZE as u64
        );
        assert_eq!(map.land_block(1, 1).unwrap(), Some(block_with(0x44)));
        assert_eq!(map.land_block(0, 1).unwrap(), Some(MapBlock {
            header: 0,
            tiles: [MapTile::default(); 64],
        }));
        // past the end of the land file
        assert!(map.land_block(3, 1).unwrap().is_none());

        let statics = vec![
            StaticTile { id: 0x0E75, x: 1, y: 2, z: 3, hue: 0 },
            StaticTile { id: 0x1F00, x: 7, y: 7, z: -10, hue: 0x21 },
        ];
        map.import_static_block(1, 1, &statics).unwrap();
        assert_eq!(map.static_block(1, 1).unwrap(), statics);
        assert!(map.static_block(0, 0).unwrap().is_empty());

        let block = map.block(1, 1).unwrap().unwrap();
        assert_eq!(block.statics, statics);

        map.import_static_block(1, 1, &[]).unwrap();
        assert!(map.static_block(1, 1).unwrap().is_empty());
    }

    #[test]
    fn test_blocks_in_rect() {
        let dir = TempDir::new().unwrap();
        let map = small_map(&dir);
        for (x, y) in map.block_coords(None) {
            map.write_land_block(x, y, &block_with((x * 10 + y) as u16))
                .unwrap();
        }
        let blocks = map.blocks(Some(BlockRect::new(1, 1, 2, 1))).unwrap();
        let ids: Vec<_> = blocks.iter().map(|b| b.land.tiles[0].id).collect();
        assert_eq!(ids, vec![11, 21]);
        assert_eq!(map.blocks(None).unwrap().len(), 8);
    }

    #[test]
    fn test_writes_off_facet_fail() {
        let dir = TempDir::new().unwrap();
        let map = small_map(&dir);
        assert!(matches!(
            map.write_land_block(4, 0, &block_with(1)),
            Err(StorageError::Config(_))
        ));
        assert!(matches!(
            map.import_static_block(0, 2, &[]),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn test_misaligned_statics_are_corrupt() {
        let dir = TempDir::new().unwrap();
        let map = small_map(&dir);
        let mut records = Vec::new();
        map.statics_pair()
            .append_raw(&[0u8; 8], 0, Some(0), &mut records)
            .unwrap();
        map.statics_pair().save_index(&records).unwrap();
        assert!(matches!(
            map.static_block(0, 0),
            Err(StorageError::Format(_))
        ));
    }

    #[test]
    fn test_reader_session_reuses_handles() {
        let dir = TempDir::new().unwrap();
        let map = small_map(&dir);
        let mut stale = map.reader();
        assert!(stale.block(0, 0).unwrap().is_none());
        assert!(!stale.has_open_handles());

        for (x, y) in map.block_coords(None) {
            map.write_land_block(x, y, &block_with(1)).unwrap();
        }
        let tile = StaticTile { id: 0x0EED, x: 0, y: 0, z: 0, hue: 0 };
        map.import_static_block(2, 0, &[tile]).unwrap();

        // A file missing at first use stays missing for that session
        assert!(stale.block(0, 0).unwrap().is_none());

        let mut reader = map.reader();
        let blocks: Vec<_> = map
            .block_coords(None)
            .map(|(x, y)| reader.block(x, y).unwrap().unwrap())
            .collect();
        assert!(reader.has_open_handles());
        assert_eq!(blocks.iter().map(|b| b.statics.len()).sum::<usize>(), 1);
        assert_eq!(blocks, map.blocks(None).unwrap());
    }
}
