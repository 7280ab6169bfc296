//! Configuration for a client installation
//!
//! Asset names are lowercase keys (`art`, `gumps`, `sound`, ...). Each asset
//! maps to its data, index and def file names, and optionally to the file id
//! its patches carry in `verdata.mul`. Both tables ship with the classic
//! client's defaults and can be overridden per shard.

use crate::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uomul_formats::multi::MultiFormat;

/// Environment variable holding the client directory
pub const ENV_CLIENT_DIR: &str = "UO_DIR";

/// Environment variable toggling the patch overlay
pub const ENV_USE_VERDATA: &str = "UO_USE_VERDATA";

/// File names backing one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFileNames {
    /// Data file, e.g. `art.mul`
    pub data: String,
    /// Index file, e.g. `artidx.mul`
    pub index: String,
    /// Legacy id translation table, if the asset has one
    #[serde(default)]
    pub def: Option<String>,
}

impl AssetFileNames {
    /// Create file names
    pub fn new(data: impl Into<String>, index: impl Into<String>, def: Option<&str>) -> Self {
        Self {
            data: data.into(),
            index: index.into(),
            def: def.map(str::to_string),
        }
    }

    /// Conventional names: `{asset}.mul`, `{asset}idx.mul`, `{asset}.def`
    pub fn conventional(asset: &str) -> Self {
        Self {
            data: format!("{asset}.mul"),
            index: format!("{asset}idx.mul"),
            def: Some(format!("{asset}.def")),
        }
    }
}

fn default_file_ids() -> BTreeMap<String, i32> {
    [
        ("art", 4),
        ("anim", 6),
        ("sound", 8),
        ("texmaps", 10),
        ("gump", 12),
        ("gumps", 12),
        ("gumpart", 12),
        ("multi", 14),
        ("skills", 16),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_file_names() -> BTreeMap<String, AssetFileNames> {
    let mut names = BTreeMap::new();
    names.insert(
        "texmaps".to_string(),
        AssetFileNames::new("texmaps.mul", "texidx.mul", None),
    );
    for key in ["gump", "gumps", "gumpart"] {
        names.insert(
            key.to_string(),
            AssetFileNames::new("gumpart.mul", "gumpidx.mul", Some("gump.def")),
        );
    }
    for key in ["multi", "multis"] {
        names.insert(key.to_string(), AssetFileNames::new("multi.mul", "multi.idx", None));
    }
    for key in ["anim", "anim2", "anim3", "anim4", "anim5", "anim6", "skills"] {
        names.insert(
            key.to_string(),
            AssetFileNames::new(format!("{key}.mul"), format!("{key}.idx"), None),
        );
    }
    names
}

/// Configuration for one client installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client directory
    pub root: PathBuf,

    /// Apply patches from the overlay file
    pub use_verdata: bool,

    /// Overlay file name inside `root`
    pub verdata_file: String,

    /// Overlay file id per asset
    pub file_ids: BTreeMap<String, i32>,

    /// File name overrides per asset
    pub file_names: BTreeMap<String, AssetFileNames>,

    /// Layout hint for multi records, inferred from length when unset
    pub multi_format: Option<MultiFormat>,

    /// Maximum records held by a cached store
    pub cache_max_entries: usize,

    /// Maximum payload bytes held by a cached store
    pub cache_max_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            use_verdata: true,
            verdata_file: "verdata.mul".to_string(),
            file_ids: default_file_ids(),
            file_names: default_file_names(),
            multi_format: None,
            cache_max_entries: 1024,
            cache_max_bytes: 256 * 1024 * 1024, // 256 MiB
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the client at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Read `UO_DIR` and `UO_USE_VERDATA` from the environment
    ///
    /// `UO_USE_VERDATA` disables the overlay when set to `0`, `false` or `no`.
    pub fn from_env() -> Result<Self> {
        let root = std::env::var_os(ENV_CLIENT_DIR)
            .ok_or_else(|| StorageError::Config(format!("{ENV_CLIENT_DIR} is not set")))?;
        let use_verdata = std::env::var(ENV_USE_VERDATA).map_or(true, |v| parse_flag(&v));
        Ok(Self::new(root).with_verdata(use_verdata))
    }

    /// Parse a JSON configuration; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StorageError::Config(format!("Invalid JSON: {e}")))
    }

    /// Load a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Set the client directory
    #[must_use]
    pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    /// Enable or disable the patch overlay
    #[must_use]
    pub const fn with_verdata(mut self, enable: bool) -> Self {
        self.use_verdata = enable;
        self
    }

    /// Set the overlay file id of an asset
    #[must_use]
    pub fn with_file_id(mut self, asset: &str, file_id: i32) -> Self {
        self.file_ids.insert(asset.to_ascii_lowercase(), file_id);
        self
    }

    /// Override the file names of an asset
    #[must_use]
    pub fn with_file_names(mut self, asset: &str, names: AssetFileNames) -> Self {
        self.file_names.insert(asset.to_ascii_lowercase(), names);
        self
    }

    /// Set the layout hint for multi records
    #[must_use]
    pub const fn with_multi_format(mut self, format: Option<MultiFormat>) -> Self {
        self.multi_format = format;
        self
    }

    /// Set the bounds of cached stores
    #[must_use]
    pub const fn with_cache_limits(mut self, max_entries: usize, max_bytes: usize) -> Self {
        self.cache_max_entries = max_entries;
        self.cache_max_bytes = max_bytes;
        self
    }

    /// Overlay file id of an asset
    pub fn file_id(&self, asset: &str) -> Option<i32> {
        self.file_ids.get(&asset.to_ascii_lowercase()).copied()
    }

    /// File names of an asset, overridden or conventional
    pub fn asset_files(&self, asset: &str) -> AssetFileNames {
        let key = asset.to_ascii_lowercase();
        self.file_names
            .get(&key)
            .cloned()
            .unwrap_or_else(|| AssetFileNames::conventional(&key))
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no")
}
