//! Legacy id translation tables (`gump.def`, `sound.def`, ...)
//!
//! Each meaningful line maps a source id to one or more replacement ids:
//!
//! ```text
//! 123 456            # single target
//! 123 { 456 }        // braces
//! 123 {456, 789} 0   first target wins, trailing columns ignored
//! ```
//!
//! Text after `#` or `//` is a comment. Lines that do not fit one of these
//! shapes are skipped.

use std::collections::BTreeMap;

/// Parsed `.def` table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefMapping {
    mapping: BTreeMap<u32, Vec<u32>>,
}

fn strip_comments(line: &str) -> &str {
    let line = line.split_once('#').map_or(line, |(head, _)| head);
    let line = line.split_once("//").map_or(line, |(head, _)| head);
    line.trim()
}

fn parse_targets(parts: &[&str]) -> Option<Vec<u32>> {
    match parts.first()? {
        &"{" => {
            let end = parts.iter().position(|&p| p == "}")?;
            parts[1..end].iter().map(|p| p.parse().ok()).collect()
        }
        single => Some(vec![single.parse().ok()?]),
    }
}

impl DefMapping {
    /// Parse a table from text
    pub fn parse(text: &str) -> Self {
        let mut mapping = BTreeMap::new();
        for raw in text.lines() {
            let line = strip_comments(raw)
                .replace('{', " { ")
                .replace('}', " } ")
                .replace(',', " ");
            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some((source, rest)) = parts.split_first() else {
                continue;
            };
            let Ok(source) = source.parse::<u32>() else {
                continue;
            };
            if let Some(targets) = parse_targets(rest).filter(|t| !t.is_empty()) {
                mapping.insert(source, targets);
            }
        }
        Self { mapping }
    }

    /// All targets of a source id
    pub fn get(&self, id: u32) -> Option<&[u32]> {
        self.mapping.get(&id).map(Vec::as_slice)
    }

    /// First target of a source id
    pub fn resolve_first(&self, id: u32) -> Option<u32> {
        self.get(id).and_then(|t| t.first().copied())
    }

    /// Number of mapped source ids
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Iterate `(source, targets)` in ascending source order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u32])> {
        self.mapping.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pairs_and_braces() {
        let def = DefMapping::parse("123 456\n10 { 20 }\n11 {20, 21}\n12 {30} 5\n");
        assert_eq!(def.resolve_first(123), Some(456));
        assert_eq!(def.resolve_first(10), Some(20));
        assert_eq!(def.get(11), Some(&[20, 21][..]));
        assert_eq!(def.get(12), Some(&[30][..]));
        assert_eq!(def.len(), 4);
    }

    #[test]
    fn test_comments_and_noise() {
        let text = "# header\n1 2 # trailing\n3 4 // other\nabc 5\n6\n7 {8\n9 { }\n// 10 11\n";
        let def = DefMapping::parse(text);
        assert_eq!(def.iter().collect::<Vec<_>>(), vec![(1, &[2][..]), (3, &[4][..])]);
        assert!(def.resolve_first(7).is_none());
        assert!(def.resolve_first(9).is_none());
        assert!(DefMapping::default().is_empty());
    }
}
