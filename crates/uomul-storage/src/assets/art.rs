//! Land tiles and static item art (`art.mul`)
//!
//! Land tiles occupy slots `0..0x4000`; static items follow from `0x4000`.

use super::write_record;
use crate::Result;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use uomul_formats::art::{LandTile, StaticArt, decode_land, decode_static, encode_land, encode_static};

/// First index slot holding static art
pub const STATIC_BASE: usize = 0x4000;

/// Art facade
#[derive(Debug, Clone)]
pub struct Art {
    index: FileIndex,
    pair: Option<MulPair>,
}

impl Art {
    /// Create a facade over an index and an optional write pair
    pub fn new(index: FileIndex, pair: Option<MulPair>) -> Self {
        Self { index, pair }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Highest static item id the index can address
    pub fn max_item_id(&self) -> u32 {
        match self.index.entry_count() {
            n if n >= 0x13FDC => 0xFFFF,
            0xC000 => 0x7FFF,
            _ => 0x3FFF,
        }
    }

    /// `item_id` when addressable, otherwise 0
    pub fn legal_item_id(&self, item_id: u32) -> u32 {
        if item_id > self.max_item_id() { 0 } else { item_id }
    }

    /// Raw land record; the id is masked to 14 bits
    pub fn land_raw(&self, land_id: u32) -> Option<Vec<u8>> {
        self.index.read((land_id & 0x3FFF) as usize)
    }

    /// Raw static record; ids past [`Art::max_item_id`] read item 0
    pub fn static_raw(&self, item_id: u32) -> Option<Vec<u8>> {
        self.index
            .read(self.legal_item_id(item_id) as usize + STATIC_BASE)
    }

    /// Decoded land tile
    pub fn land(&self, land_id: u32) -> Result<Option<LandTile>> {
        Ok(self
            .land_raw(land_id)
            .map(|raw| decode_land(&raw))
            .transpose()?)
    }

    /// Decoded static art
    pub fn static_art(&self, item_id: u32) -> Result<Option<StaticArt>> {
        Ok(self
            .static_raw(item_id)
            .map(|raw| decode_static(&raw))
            .transpose()?)
    }

    /// Encode 44x44 land pixels and write them to `land_id`
    pub fn import_land(&self, land_id: u32, pixels: &[u16]) -> Result<()> {
        let payload = encode_land(pixels)?;
        write_record(
            self.pair.as_ref(),
            "art",
            (land_id & 0x3FFF) as usize,
            &payload,
            0,
        )
    }

    /// Encode static art and write it to `item_id`
    pub fn import_static(&self, item_id: u32, art: &StaticArt) -> Result<()> {
        let payload = encode_static(art)?;
        write_record(
            self.pair.as_ref(),
            "art",
            self.legal_item_id(item_id) as usize + STATIC_BASE,
            &payload,
            0,
        )
    }
}
