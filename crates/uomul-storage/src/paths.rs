//! Case-insensitive file lookup
//!
//! Client installations copied between file systems end up with mixed case
//! names (`ArtIdx.MUL`, `artidx.mul`). Lookups try the exact name first and
//! then scan the directory once.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Find `name` in `dir`, ignoring ASCII case
///
/// Returns `None` when no entry matches or the directory cannot be read.
pub fn resolve(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.exists() {
        return Some(direct);
    }

    let entries = fs::read_dir(dir).ok()?;
    let found = entries
        .filter_map(std::result::Result::ok)
        .find(|e| e.file_name().to_str().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .map(|e| e.path());
    trace!("case-insensitive lookup of {} in {}: {:?}", name, dir.display(), found);
    found
}

/// Resolve `name` in `dir`, or the path it would be created at
pub fn resolve_or_join(dir: &Path, name: &str) -> PathBuf {
    resolve(dir, name).unwrap_or_else(|| dir.join(name))
}

/// Size of a regular file, `None` when missing or unreadable
pub fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().filter(fs::Metadata::is_file).map(|m| m.len())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_ignores_case() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ArtIdx.MUL"), b"x").unwrap();

        let found = resolve(dir.path(), "artidx.mul").unwrap();
        assert_eq!(found.file_name().unwrap(), "ArtIdx.MUL");
        assert!(resolve(dir.path(), "art.mul").is_none());
        assert_eq!(resolve_or_join(dir.path(), "art.mul"), dir.path().join("art.mul"));
        assert_eq!(file_size(&found), Some(1));
        assert_eq!(file_size(dir.path()), None);
    }
}
