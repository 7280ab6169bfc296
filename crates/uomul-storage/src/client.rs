//! Client installation entry point

use crate::assets::{
    Animations, Art, Gumps, Lights, MapFiles, Multis, Skills, Sounds, Textures, UnicodeFonts,
};
use crate::config::ClientConfig;
use crate::file_index::FileIndex;
use crate::pair::MulPair;
use crate::verdata::Verdata;
use crate::{Result, StorageError, paths};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uomul_formats::MulFormat;
use uomul_formats::animinfo::AnimInfo;
use uomul_formats::cliloc::Cliloc;
use uomul_formats::def::DefMapping;
use uomul_formats::fonts::AsciiFonts;
use uomul_formats::hues::HueTable;
use uomul_formats::radarcol::RadarColors;
use uomul_formats::skill_groups::SkillGroups;
use uomul_formats::speech::SpeechList;
use uomul_formats::tiledata::TileData;

/// An opened client installation
///
/// Holds the configuration and the patch overlay, which is parsed once and
/// shared by every [`FileIndex`] handed out. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ClientFiles {
    config: Arc<ClientConfig>,
    overlay: Arc<Verdata>,
}

impl ClientFiles {
    /// Open the installation described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the client directory does not
    /// exist, or an error if the patch overlay is present but malformed.
    pub fn open(config: ClientConfig) -> Result<Self> {
        if !config.root.is_dir() {
            return Err(StorageError::NotFound(config.root));
        }

        let overlay = if config.use_verdata {
            Verdata::open(&config.root, &config.verdata_file)?
        } else {
            debug!("Patch overlay disabled");
            Verdata::empty()
        };

        info!(
            "Opened client at {} ({} patches)",
            config.root.display(),
            overlay.table().len()
        );

        Ok(Self {
            config: Arc::new(config),
            overlay: Arc::new(overlay),
        })
    }

    /// Open the installation named by the environment
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`] and [`ClientFiles::open`].
    pub fn from_env() -> Result<Self> {
        Self::open(ClientConfig::from_env()?)
    }

    /// Configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Client directory
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Shared patch overlay
    pub fn overlay(&self) -> &Arc<Verdata> {
        &self.overlay
    }

    /// Existing file in the client directory, ignoring case
    pub fn file_path(&self, name: &str) -> Option<PathBuf> {
        paths::resolve(&self.config.root, name)
    }

    /// Existing file or the path it would be created at
    pub fn file_path_or_default(&self, name: &str) -> PathBuf {
        paths::resolve_or_join(&self.config.root, name)
    }

    /// Read accessor for an asset's index/data pair
    ///
    /// The pair's files need not exist; reads then report nothing.
    pub fn file_index(&self, asset: &str) -> FileIndex {
        let names = self.config.asset_files(asset);
        let index = FileIndex::new(
            self.file_path_or_default(&names.index),
            self.file_path_or_default(&names.data),
        );
        if self.config.use_verdata {
            index.with_overlay(Arc::clone(&self.overlay), self.config.file_id(asset))
        } else {
            index
        }
    }

    /// Write accessor for an asset's index/data pair
    pub fn mul_pair(&self, asset: &str) -> MulPair {
        let names = self.config.asset_files(asset);
        MulPair::new(
            self.file_path_or_default(&names.data),
            self.file_path_or_default(&names.index),
        )
    }

    /// Legacy id translations of an asset, if it has a def file
    ///
    /// # Errors
    ///
    /// Returns an error if the def file exists but cannot be read.
    pub fn def_mapping(&self, asset: &str) -> Result<Option<DefMapping>> {
        let Some(name) = self.config.asset_files(asset).def else {
            return Ok(None);
        };
        let Some(path) = self.file_path(&name) else {
            return Ok(None);
        };
        let bytes = fs::read(&path)?;
        // Def files are single-byte text; map each byte to its code point
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        let mapping = DefMapping::parse(&text);
        debug!("Loaded {} translations from {}", mapping.len(), path.display());
        Ok(Some(mapping))
    }

    /// Static and land art
    pub fn art(&self) -> Art {
        Art::new(self.file_index("art"), Some(self.mul_pair("art")))
    }

    /// Gump images
    ///
    /// # Errors
    ///
    /// Returns an error if `gump.def` exists but cannot be read.
    pub fn gumps(&self) -> Result<Gumps> {
        Ok(Gumps::new(
            self.file_index("gumps"),
            Some(self.mul_pair("gumps")),
            self.def_mapping("gumps")?,
        ))
    }

    /// Land textures
    pub fn textures(&self) -> Textures {
        Textures::new(self.file_index("texmaps"), Some(self.mul_pair("texmaps")))
    }

    /// Animations of one file set (1 to 6)
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] for a file set outside 1 to 6.
    pub fn animations(&self, file_set: u8) -> Result<Animations> {
        let asset = match file_set {
            1 => "anim".to_string(),
            2..=6 => format!("anim{file_set}"),
            other => {
                return Err(StorageError::Config(format!(
                    "Animation file set {other} is not in 1..=6"
                )));
            }
        };
        Ok(Animations::new(self.file_index(&asset), file_set))
    }

    /// Multi structures, decoded with the configured layout hint
    pub fn multis(&self) -> Multis {
        Multis::new(
            self.file_index("multi"),
            Some(self.mul_pair("multi")),
            self.config.multi_format,
        )
    }

    /// Land and statics of one facet
    pub fn map(&self, map_id: u8) -> MapFiles {
        MapFiles::new(
            map_id,
            self.file_path_or_default(&format!("map{map_id}.mul")),
            MulPair::new(
                self.file_path_or_default(&format!("statics{map_id}.mul")),
                self.file_path_or_default(&format!("staidx{map_id}.mul")),
            ),
        )
    }

    /// Light maps
    pub fn lights(&self) -> Lights {
        Lights::new(self.file_index("light"), Some(self.mul_pair("light")))
    }

    /// Sound effects
    ///
    /// # Errors
    ///
    /// Returns an error if `sound.def` exists but cannot be read.
    pub fn sounds(&self) -> Result<Sounds> {
        Ok(Sounds::new(
            self.file_index("sound"),
            Some(self.mul_pair("sound")),
            self.def_mapping("sound")?,
        ))
    }

    /// Skill names
    pub fn skills(&self) -> Skills {
        Skills::new(self.file_index("skills"), Some(self.mul_pair("skills")))
    }

    /// Hue table; a missing `hues.mul` yields default hues
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn hues(&self) -> Result<HueTable> {
        Ok(self.load_blob("hues.mul")?.unwrap_or_default())
    }

    /// The ten ASCII fonts, if `fonts.mul` exists
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn ascii_fonts(&self) -> Result<Option<AsciiFonts>> {
        self.load_blob("fonts.mul")
    }

    /// All present unicode fonts
    ///
    /// # Errors
    ///
    /// Returns an error if a present font file cannot be read or decoded.
    pub fn unicode_fonts(&self) -> Result<UnicodeFonts> {
        UnicodeFonts::load(self)
    }

    /// Tile data, if `tiledata.mul` exists
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn tile_data(&self) -> Result<Option<TileData>> {
        self.load_blob("tiledata.mul")
    }

    /// Radar colors; a missing `radarcol.mul` yields the default table
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn radar_colors(&self) -> Result<RadarColors> {
        Ok(self.load_blob("radarcol.mul")?.unwrap_or_default())
    }

    /// Localized strings from `cliloc.<language>`; missing yields an empty table
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn cliloc(&self, language: &str) -> Result<Cliloc> {
        Ok(self
            .load_blob(&format!("cliloc.{language}"))?
            .unwrap_or_default())
    }

    /// Speech keywords; a missing `speech.mul` yields an empty list
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn speech(&self) -> Result<SpeechList> {
        Ok(self.load_blob("speech.mul")?.unwrap_or_default())
    }

    /// Skill groups; a missing `skillgrp.mul` yields only the "Misc" group
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn skill_groups(&self) -> Result<SkillGroups> {
        Ok(self.load_blob("skillgrp.mul")?.unwrap_or_default())
    }

    /// Animation info; a missing `animinfo.mul` yields an empty table
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn anim_info(&self) -> Result<AnimInfo> {
        Ok(self.load_blob("animinfo.mul")?.unwrap_or_default())
    }

    /// Decode a single-file asset, `None` when the file is missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load_blob<T: MulFormat>(&self, name: &str) -> Result<Option<T>> {
        let Some(path) = self.file_path(name) else {
            debug!("{} not found in {}", name, self.config.root.display());
            return Ok(None);
        };
        let data = fs::read(&path)?;
        let value = T::parse(&data)?;
        debug!("Loaded {} ({} bytes)", path.display(), data.len());
        Ok(Some(value))
    }

    /// Encode a single-file asset into `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or written.
    pub fn save_blob<T: MulFormat, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = value.build()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &data)?;
        debug!("Wrote {} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_requires_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            ClientFiles::open(ClientConfig::new(&missing)),
            Err(StorageError::NotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_asset_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("GUMPIDX.MUL"), b"").unwrap();
        let files = ClientFiles::open(ClientConfig::new(dir.path())).unwrap();

        let gumps = files.file_index("gumps");
        assert_eq!(gumps.index_path(), dir.path().join("GUMPIDX.MUL"));
        assert_eq!(gumps.data_path(), dir.path().join("gumpart.mul"));
        assert_eq!(gumps.file_id(), Some(12));

        let light = files.file_index("light");
        assert_eq!(light.index_path(), dir.path().join("lightidx.mul"));
        assert_eq!(light.file_id(), None);

        let pair = files.mul_pair("multi");
        assert_eq!(pair.index_path(), dir.path().join("multi.idx"));

        let no_overlay = ClientFiles::open(ClientConfig::new(dir.path()).with_verdata(false))
            .unwrap()
            .file_index("art");
        assert!(no_overlay.overlay().is_none());
    }

    #[test]
    fn test_def_mapping_and_blobs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sound.def"), b"10 {20, 30} # comment\n").unwrap();
        let files = ClientFiles::open(ClientConfig::new(dir.path())).unwrap();

        let mapping = files.def_mapping("sound").unwrap().unwrap();
        assert_eq!(mapping.resolve_first(10), Some(20));
        assert!(files.def_mapping("gumps").unwrap().is_none());
        assert!(files.def_mapping("texmaps").unwrap().is_none());

        assert_eq!(files.hues().unwrap(), HueTable::default());
        assert_eq!(files.radar_colors().unwrap(), RadarColors::default());
        assert!(files.tile_data().unwrap().is_none());
        assert!(files.ascii_fonts().unwrap().is_none());

        let mut colors = RadarColors::default();
        colors.set_land_color(1, 0x1234);
        ClientFiles::save_blob(&colors, dir.path().join("radarcol.mul")).unwrap();
        assert_eq!(files.radar_colors().unwrap().land_color(1), 0x1234);

        assert!(files.cliloc("enu").unwrap().is_empty());
        assert!(files.speech().unwrap().entries().is_empty());
        assert_eq!(files.skill_groups().unwrap(), SkillGroups::default());
        assert!(files.anim_info().unwrap().entries().is_empty());

        assert!(matches!(files.animations(7), Err(StorageError::Config(_))));
    }
}
