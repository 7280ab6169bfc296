//! Gump images (`gumpart.mul`)

use super::{read_translated, write_record};
use crate::Result;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use tracing::debug;
use uomul_formats::def::DefMapping;
use uomul_formats::gump::{
    Gump, decode_gump, dimensions_from_extra, encode_gump, extra_from_dimensions,
};

/// Gump facade
///
/// Image dimensions live in the index `extra` as `width << 16 | height`.
#[derive(Debug, Clone)]
pub struct Gumps {
    index: FileIndex,
    pair: Option<MulPair>,
    defs: Option<DefMapping>,
}

impl Gumps {
    /// Create a facade; `defs` translates ids missing from the index
    pub fn new(index: FileIndex, pair: Option<MulPair>, defs: Option<DefMapping>) -> Self {
        Self { index, pair, defs }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Raw record with its dimensions
    ///
    /// Records without usable dimensions are reported as absent.
    pub fn raw(&self, id: usize) -> Option<(Vec<u8>, u16, u16)> {
        let (slot, record) = read_translated(&self.index, self.defs.as_ref(), id)?;
        let Some((width, height)) = dimensions_from_extra(record.extra) else {
            debug!("Gump {} has no dimensions (extra {:#x})", slot, record.extra);
            return None;
        };
        Some((record.data, width, height))
    }

    /// Decoded gump
    pub fn gump(&self, id: usize) -> Result<Option<Gump>> {
        Ok(self
            .raw(id)
            .map(|(raw, width, height)| decode_gump(&raw, width, height))
            .transpose()?)
    }

    /// Encode a gump and write it to `id`
    pub fn import_gump(&self, id: usize, gump: &Gump) -> Result<()> {
        let payload = encode_gump(gump)?;
        let extra = extra_from_dimensions(gump.width, gump.height);
        write_record(self.pair.as_ref(), "gumps", id, &payload, extra)
    }
}
