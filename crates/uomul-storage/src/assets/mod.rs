//! Typed asset facades
//!
//! Each facade wraps the [`FileIndex`] of one asset and decodes its records
//! with the matching codec from `uomul-formats`. Facades built through
//! [`ClientFiles`](crate::ClientFiles) also carry a [`MulPair`] and accept
//! imports; facades built without one reject writes with
//! [`StorageError::NotWritable`].
//!
//! Reads follow one convention throughout:
//!
//! - `Ok(None)` when the record is absent, empty or out of bounds
//! - `Err(StorageError::Format(..))` when the record exists but is corrupt

use crate::file_index::{FileIndex, RawRecord};
use crate::pair::MulPair;
use crate::{Result, StorageError};
use tracing::{debug, info};
use uomul_formats::def::DefMapping;

mod animations;
mod art;
mod fonts;
mod gumps;
mod lights;
mod map;
mod multis;
mod skills;
mod sounds;
mod textures;

pub use animations::Animations;
pub use art::{Art, STATIC_BASE};
pub use fonts::UnicodeFonts;
pub use gumps::Gumps;
pub use lights::Lights;
pub use map::{BlockRect, MapBlockData, MapFiles, MapReader};
pub use multis::{MultiText, Multis};
pub use skills::{SkillRecord, Skills};
pub use sounds::Sounds;
pub use textures::Textures;

/// Append `payload` to a facade's pair and point slot `index` at it
pub(crate) fn write_record(
    pair: Option<&MulPair>,
    facade: &str,
    index: usize,
    payload: &[u8],
    extra: i32,
) -> Result<()> {
    let pair = pair.ok_or_else(|| {
        StorageError::NotWritable(format!("{facade} facade was opened without a data file"))
    })?;
    let mut records = pair.load_index()?;
    pair.append_raw(payload, extra, Some(index), &mut records)?;
    pair.save_index(&records)?;
    info!(
        "Imported {} record {} ({} bytes)",
        facade,
        index,
        payload.len()
    );
    Ok(())
}

/// Read `id`, falling back to its first def translation
///
/// Returns the record together with the slot it was read from.
pub(crate) fn read_translated(
    index: &FileIndex,
    defs: Option<&DefMapping>,
    id: usize,
) -> Option<(usize, RawRecord)> {
    if let Some(record) = index.read_record(id) {
        return Some((id, record));
    }
    let target = defs?.resolve_first(u32::try_from(id).ok()?)?;
    let target = usize::try_from(target).ok()?;
    let record = index.read_record(target)?;
    debug!("Translated record {} to {}", id, target);
    Some((target, record))
}
