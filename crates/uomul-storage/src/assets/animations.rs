//! Creature and equipment animations (`anim.mul` .. `anim6.mul`)
//!
//! Records are grouped per body. Each body owns a fixed block of slots whose
//! size depends on the body class and the file set:
//!
//! ```text
//! 110 slots  high detail   22 actions x 5 directions
//!  65 slots  low detail    13 actions x 5 directions
//! 175 slots  people        35 actions x 5 directions
//! ```
//!
//! Only five directions are stored; directions 5 to 7 reuse 3 to 1 mirrored.

use crate::Result;
use crate::file_index::FileIndex;
use uomul_formats::animation::{AnimationFrame, decode_animation};

/// Animation facade for one file set
#[derive(Debug, Clone)]
pub struct Animations {
    index: FileIndex,
    file_set: u8,
}

fn body_base(file_set: u8, body: i64) -> Option<i64> {
    let high = |b: i64| b * 110;
    let low = |b: i64| 22_000 + (b - 200) * 65;
    let people = |b: i64| 35_000 + (b - 400) * 175;

    let base = match file_set {
        1 | 4 => {
            if body < 200 {
                high(body)
            } else if body < 400 {
                low(body)
            } else {
                people(body)
            }
        }
        2 => {
            if body < 200 {
                high(body)
            } else {
                low(body)
            }
        }
        3 => {
            if body < 300 {
                body * 65
            } else if body < 400 {
                33_000 + (body - 300) * 110
            } else {
                people(body)
            }
        }
        5 | 6 => {
            if body < 200 && body != 34 {
                high(body)
            } else if body < 400 {
                low(body)
            } else {
                people(body)
            }
        }
        _ => return None,
    };
    Some(base)
}

impl Animations {
    /// Create a facade for `file_set` (1 to 6)
    pub fn new(index: FileIndex, file_set: u8) -> Self {
        Self { index, file_set }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// File set this facade reads
    pub fn file_set(&self) -> u8 {
        self.file_set
    }

    /// Slot of `(body, action, direction)` and whether it is drawn mirrored
    ///
    /// Returns `None` for an unknown file set or a slot that would fall before
    /// the start of the index.
    pub fn record_index(
        file_set: u8,
        body: u16,
        action: u16,
        direction: u8,
    ) -> Option<(usize, bool)> {
        let base = body_base(file_set, i64::from(body))?;
        let direction = i64::from(direction);
        let offset = if direction <= 4 {
            direction
        } else {
            direction - (direction - 4) * 2
        };
        let index = base + i64::from(action) * 5 + offset;
        Some((usize::try_from(index).ok()?, direction > 4))
    }

    /// Raw record of `(body, action, direction)`
    pub fn raw(&self, body: u16, action: u16, direction: u8) -> Option<Vec<u8>> {
        let (index, _) = Self::record_index(self.file_set, body, action, direction)?;
        self.index.read(index)
    }

    /// Decoded frames of `(body, action, direction)`, mirrored for directions 5 to 7
    pub fn frames(
        &self,
        body: u16,
        action: u16,
        direction: u8,
    ) -> Result<Option<Vec<AnimationFrame>>> {
        let Some((index, flip)) = Self::record_index(self.file_set, body, action, direction)
        else {
            return Ok(None);
        };
        Ok(self
            .index
            .read(index)
            .map(|raw| decode_animation(&raw, flip))
            .transpose()?)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_index_per_file_set() {
        assert_eq!(Animations::record_index(1, 0, 0, 0), Some((0, false)));
        assert_eq!(Animations::record_index(1, 1, 2, 3), Some((110 + 10 + 3, false)));
        assert_eq!(Animations::record_index(1, 200, 0, 0), Some((22_000, false)));
        assert_eq!(Animations::record_index(1, 400, 1, 0), Some((35_005, false)));

        assert_eq!(Animations::record_index(2, 500, 0, 0), Some((22_000 + 300 * 65, false)));
        assert_eq!(Animations::record_index(3, 299, 0, 0), Some((299 * 65, false)));
        assert_eq!(Animations::record_index(3, 300, 0, 0), Some((33_000, false)));

        // Body 34 is low detail in sets 5 and 6
        assert_eq!(Animations::record_index(5, 34, 0, 0), Some((11_210, false)));
        assert_eq!(Animations::record_index(6, 33, 0, 0), Some((33 * 110, false)));

        assert_eq!(Animations::record_index(7, 0, 0, 0), None);
    }

    #[test]
    fn test_mirrored_directions() {
        assert_eq!(Animations::record_index(1, 0, 0, 4), Some((4, false)));
        assert_eq!(Animations::record_index(1, 0, 0, 5), Some((3, true)));
        assert_eq!(Animations::record_index(1, 0, 0, 6), Some((2, true)));
        assert_eq!(Animations::record_index(1, 0, 0, 7), Some((1, true)));
    }
}
