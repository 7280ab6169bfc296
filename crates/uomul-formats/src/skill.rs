//! Skill records (`skills.mul`)
//!
//! A record is a one-byte action flag followed by the skill name, latin-1,
//! terminated by NUL or the end of the record.

use crate::error::{FormatError, Result};

/// Skill definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillInfo {
    /// Whether the skill has an activation button
    pub is_action: bool,
    /// Display name
    pub name: String,
}

/// Decode a skill record
pub fn decode_skill(raw: &[u8]) -> Result<SkillInfo> {
    let Some((&flag, rest)) = raw.split_first() else {
        return Err(FormatError::Truncated {
            context: "skill record",
            needed: 1,
            available: 0,
        });
    };
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    Ok(SkillInfo {
        is_action: flag != 0,
        name: rest[..end].iter().map(|&b| char::from(b)).collect(),
    })
}

/// Encode a skill record with a terminating NUL
///
/// Characters outside latin-1 become `?`.
pub fn encode_skill(skill: &SkillInfo) -> Vec<u8> {
    let mut out = vec![u8::from(skill.is_action)];
    out.extend(
        skill
            .name
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')),
    );
    out.push(0);
    out
}
