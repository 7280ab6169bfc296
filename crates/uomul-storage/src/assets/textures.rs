//! Land textures (`texmaps.mul`)

use super::write_record;
use crate::Result;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use uomul_formats::texture::{Texture, decode_texture, encode_texture};

/// Texture facade
#[derive(Debug, Clone)]
pub struct Textures {
    index: FileIndex,
    pair: Option<MulPair>,
}

impl Textures {
    /// Create a facade over an index and an optional write pair
    pub fn new(index: FileIndex, pair: Option<MulPair>) -> Self {
        Self { index, pair }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Decoded texture; the size comes from the index `extra`
    pub fn texture(&self, index: usize) -> Result<Option<Texture>> {
        Ok(self
            .index
            .read_record(index)
            .map(|record| decode_texture(&record.data, record.extra))
            .transpose()?)
    }

    /// Encode a 64x64 or 128x128 texture and write it to `index`
    pub fn import_texture(&self, index: usize, texture: &Texture) -> Result<()> {
        let (payload, extra) = encode_texture(texture)?;
        write_record(self.pair.as_ref(), "texmaps", index, &payload, extra)
    }
}
