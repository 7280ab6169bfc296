//! Light maps (`light.mul`)

use super::write_record;
use crate::Result;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use tracing::debug;
use uomul_formats::light::{LightImage, decode_light, dims_from_extra, encode_light};

/// Light facade
#[derive(Debug, Clone)]
pub struct Lights {
    index: FileIndex,
    pair: Option<MulPair>,
}

impl Lights {
    /// Create a facade over an index and an optional write pair
    pub fn new(index: FileIndex, pair: Option<MulPair>) -> Self {
        Self { index, pair }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Decoded light map
    ///
    /// Dimensions are recovered from the index `extra`; a record whose
    /// `extra` yields no plausible dimensions is reported as absent.
    pub fn light(&self, index: usize) -> Result<Option<LightImage>> {
        let Some(record) = self.index.read_record(index) else {
            return Ok(None);
        };
        let Some((width, height)) = dims_from_extra(record.data.len(), record.extra) else {
            debug!("Light {} has no dimensions (extra {:#x})", index, record.extra);
            return Ok(None);
        };
        Ok(Some(decode_light(&record.data, width, height)?))
    }

    /// Encode a light map and write it to `index`
    pub fn import_light(&self, index: usize, light: &LightImage) -> Result<()> {
        let (payload, extra) = encode_light(light)?;
        write_record(self.pair.as_ref(), "light", index, &payload, extra)
    }
}
