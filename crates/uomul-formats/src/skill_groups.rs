//! Skill groups (`skillgrp.mul`)
//!
//! ```text
//! count: i32                  or  -1: i32, count: i32 for UTF-16 names
//! names: (count - 1) × 17 bytes   (34 bytes when UTF-16), NUL padded
//! skill → group table: i32 × n until end of file
//! ```
//!
//! Group 0 is an implicit "Misc" group that has no name slot in the file.

use crate::MulFormat;
use crate::bytes::{latin1_field, read_i32};
use crate::error::{EncodeError, EncodeResult, Result};

/// Name of the implicit group 0
pub const MISC_GROUP: &str = "Misc";

/// Characters in a group name slot
pub const GROUP_NAME_CHARS: usize = 17;

/// Skill group names and the skill-to-group table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillGroups {
    /// Group names, index 0 always [`MISC_GROUP`]
    groups: Vec<String>,
    /// Group id per skill
    pub skill_groups: Vec<i32>,
    /// Whether names are stored as UTF-16
    pub unicode: bool,
}

impl Default for SkillGroups {
    fn default() -> Self {
        Self {
            groups: vec![MISC_GROUP.to_string()],
            skill_groups: Vec::new(),
            unicode: false,
        }
    }
}

fn utf16_field(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units).trim().to_string()
}

impl SkillGroups {
    /// Group names, index 0 first
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Name of group `id`
    pub fn group_name(&self, id: usize) -> Option<&str> {
        self.groups.get(id).map(String::as_str)
    }

    /// Append a named group, returning its id
    pub fn add_group(&mut self, name: impl Into<String>) -> usize {
        self.groups.push(name.into());
        self.groups.len() - 1
    }

    /// Group id of skill `skill`
    pub fn group_of(&self, skill: usize) -> Option<i32> {
        self.skill_groups.get(skill).copied()
    }

    fn name_slot(&self, name: &str) -> EncodeResult<Vec<u8>> {
        if self.unicode {
            let units: Vec<u16> = name.encode_utf16().collect();
            if units.len() > GROUP_NAME_CHARS {
                return Err(EncodeError::TooLarge {
                    context: "skill group name",
                    size: units.len(),
                    limit: GROUP_NAME_CHARS,
                });
            }
            let mut slot = vec![0u8; GROUP_NAME_CHARS * 2];
            for (chunk, unit) in slot.chunks_exact_mut(2).zip(units) {
                chunk.copy_from_slice(&unit.to_le_bytes());
            }
            Ok(slot)
        } else {
            let chars = name.chars().count();
            if chars > GROUP_NAME_CHARS {
                return Err(EncodeError::TooLarge {
                    context: "skill group name",
                    size: chars,
                    limit: GROUP_NAME_CHARS,
                });
            }
            let mut slot = vec![0u8; GROUP_NAME_CHARS];
            for (byte, ch) in slot.iter_mut().zip(name.chars()) {
                *byte = u8::try_from(u32::from(ch)).unwrap_or(b'?');
            }
            Ok(slot)
        }
    }
}

impl MulFormat for SkillGroups {
    /// Decode a group file
    ///
    /// A count of zero or less yields only the implicit group. Name slots
    /// past the end of the data are dropped, and a trailing partial `i32` is
    /// ignored.
    fn parse(data: &[u8]) -> Result<Self> {
        let mut count = read_i32(data, 0, "skillgrp header")?;
        let (unicode, start, slot_len) = if count == -1 {
            count = read_i32(data, 4, "skillgrp header")?;
            (true, 8, GROUP_NAME_CHARS * 2)
        } else {
            (false, 4, GROUP_NAME_CHARS)
        };

        let mut groups = Self {
            unicode,
            ..Self::default()
        };
        let Ok(count) = usize::try_from(count) else {
            return Ok(groups);
        };
        if count == 0 {
            return Ok(groups);
        }

        for i in 0..count - 1 {
            let offset = start + i * slot_len;
            let Some(slot) = data.get(offset..) else {
                break;
            };
            if slot.is_empty() {
                break;
            }
            let slot = &slot[..slot.len().min(slot_len)];
            groups.groups.push(if unicode {
                utf16_field(slot)
            } else {
                latin1_field(slot)
            });
        }

        let table = start.saturating_add((count - 1).saturating_mul(slot_len));
        if let Some(tail) = data.get(table..) {
            groups.skill_groups = tail
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
        }
        Ok(groups)
    }

    fn build(&self) -> EncodeResult<Vec<u8>> {
        let count = i32::try_from(self.groups.len().max(1)).map_err(|_| EncodeError::TooLarge {
            context: "skill group count",
            size: self.groups.len(),
            limit: i32::MAX as usize,
        })?;

        let mut out = Vec::new();
        if self.unicode {
            out.extend_from_slice(&(-1i32).to_le_bytes());
        }
        out.extend_from_slice(&count.to_le_bytes());
        for name in self.groups.iter().skip(1) {
            out.extend(self.name_slot(name)?);
        }
        for group in &self.skill_groups {
            out.extend_from_slice(&group.to_le_bytes());
        }
        Ok(out)
    }
}
