//! Multi structures (`multi.mul`)

use super::write_record;
use crate::Result;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use uomul_formats::multi::{
    MultiFormat, MultiTile, decode_multi, encode_multi, format_txt, format_uoa, format_wsc,
    parse_txt, parse_uoa, parse_wsc,
};

/// Text formats for multi export and import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiText {
    /// `0xITEM X Y Z FLAGS` per line
    Txt,
    /// World save `SECTION WORLDITEM` blocks
    Wsc,
    /// UO Architect component list
    Uoa,
}

/// Multi facade
#[derive(Debug, Clone)]
pub struct Multis {
    index: FileIndex,
    pair: Option<MulPair>,
    format: Option<MultiFormat>,
}

impl Multis {
    /// Create a facade; `format` pins the record layout instead of inferring it
    pub fn new(index: FileIndex, pair: Option<MulPair>, format: Option<MultiFormat>) -> Self {
        Self {
            index,
            pair,
            format,
        }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Components of multi `index` and the layout they were read with
    pub fn tiles(&self, index: usize) -> Result<Option<(Vec<MultiTile>, MultiFormat)>> {
        Ok(self
            .index
            .read(index)
            .map(|raw| decode_multi(&raw, self.format))
            .transpose()?)
    }

    /// Export multi `index` as text
    pub fn export(&self, index: usize, text: MultiText) -> Result<Option<String>> {
        Ok(self.tiles(index)?.map(|(tiles, _)| match text {
            MultiText::Txt => format_txt(&tiles),
            MultiText::Wsc => format_wsc(&tiles),
            MultiText::Uoa => format_uoa(&tiles),
        }))
    }

    /// Write components to `index`
    ///
    /// Without a layout, the configured one is used, then the smallest
    /// layout that holds every flag value.
    pub fn import_tiles(
        &self,
        index: usize,
        tiles: &[MultiTile],
        format: Option<MultiFormat>,
    ) -> Result<()> {
        let format = format
            .or(self.format)
            .unwrap_or_else(|| MultiFormat::for_tiles(tiles));
        let payload = encode_multi(tiles, format)?;
        write_record(self.pair.as_ref(), "multi", index, &payload, 0)
    }

    /// Parse text, recenter it and write the components to `index`
    ///
    /// Returns the number of components written.
    pub fn import(
        &self,
        index: usize,
        text: MultiText,
        source: &str,
        format: Option<MultiFormat>,
    ) -> Result<usize> {
        let tiles = match text {
            MultiText::Txt => parse_txt(source),
            MultiText::Wsc => parse_wsc(source),
            MultiText::Uoa => parse_uoa(source),
        };
        self.import_tiles(index, &tiles, format)?;
        Ok(tiles.len())
    }
}
