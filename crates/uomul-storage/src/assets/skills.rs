//! Skill names (`skills.mul`)

use super::write_record;
use crate::Result;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use uomul_formats::skill::{SkillInfo, decode_skill, encode_skill};

/// One decoded skill with its slot and index `extra`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRecord {
    /// Slot in the index
    pub index: usize,
    /// Index `extra` value
    pub extra: i32,
    /// Decoded record
    pub info: SkillInfo,
}

/// Skill facade
#[derive(Debug, Clone)]
pub struct Skills {
    index: FileIndex,
    pair: Option<MulPair>,
}

impl Skills {
    /// Create a facade over an index and an optional write pair
    pub fn new(index: FileIndex, pair: Option<MulPair>) -> Self {
        Self { index, pair }
    }

    /// Underlying index
    pub fn file_index(&self) -> &FileIndex {
        &self.index
    }

    /// Decoded skill
    pub fn skill(&self, index: usize) -> Result<Option<SkillRecord>> {
        let Some(record) = self.index.read_record(index) else {
            return Ok(None);
        };
        Ok(Some(SkillRecord {
            index,
            extra: record.extra,
            info: decode_skill(&record.data)?,
        }))
    }

    /// Every readable skill in index order
    pub fn all(&self) -> Result<Vec<SkillRecord>> {
        let mut reader = self.index.open_reader()?;
        let count = reader.snapshot().len();
        let mut skills = Vec::new();
        for index in 0..count {
            if let Some(record) = reader.read_record(index) {
                skills.push(SkillRecord {
                    index,
                    extra: record.extra,
                    info: decode_skill(&record.data)?,
                });
            }
        }
        Ok(skills)
    }

    /// Write a skill to `index`
    pub fn import_skill(&self, index: usize, skill: &SkillInfo, extra: i32) -> Result<()> {
        write_record(self.pair.as_ref(), "skills", index, &encode_skill(skill), extra)
    }
}
