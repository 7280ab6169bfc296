//! Sound effects (`sound.mul`)

use super::{read_translated, write_record};
use crate::Result;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use uomul_formats::def::DefMapping;
use uomul_formats::sound::{SoundRecord, decode_sound, encode_sound};

/// Sound facade
///
/// Ids missing from the index are translated through `sound.def` when one
/// is present.
#[derive(Debug, Clone)]
pub struct Sounds {
    index: FileIndex,
    pair: Option<MulPair>,
    defs: Option<DefMapping>,
}

impl Sounds {
    /// Create a facade; `defs` translates ids missing from the index
    pub fn new(index: FileIndex, pair: Option<MulPair>, defs: Option<DefMapping>) -> Self {
        Self { index, pair, defs }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Slot `id` is read from and whether it was translated
    pub fn resolve(&self, id: usize) -> Option<(usize, bool)> {
        let snapshot = self.index.snapshot().ok()?;
        if self.index.valid_in(&snapshot, id) {
            return Some((id, false));
        }
        let target = self.defs.as_ref()?.resolve_first(u32::try_from(id).ok()?)?;
        let target = usize::try_from(target).ok()?;
        self.index
            .valid_in(&snapshot, target)
            .then_some((target, true))
    }

    /// Decoded sound
    pub fn sound(&self, id: usize) -> Result<Option<SoundRecord>> {
        Ok(read_translated(&self.index, self.defs.as_ref(), id)
            .map(|(_, record)| decode_sound(&record.data))
            .transpose()?)
    }

    /// Write a sound to `id`
    pub fn import_sound(&self, id: usize, sound: &SoundRecord) -> Result<()> {
        write_record(self.pair.as_ref(), "sound", id, &encode_sound(sound), 0)
    }
}
