//! Unicode font set (`unifont*.mul`)

use crate::client::ClientFiles;
use crate::{Result, StorageError};
use std::path::{Path, PathBuf};
use uomul_formats::fonts::unicode::UNICODE_FONT_COUNT;
use uomul_formats::fonts::{UnicodeFont, unifont_filename};

/// The client's unicode fonts, indexed by font id
///
/// Fonts whose file is missing are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnicodeFonts {
    fonts: Vec<Option<UnicodeFont>>,
}

impl UnicodeFonts {
    pub(crate) fn load(files: &ClientFiles) -> Result<Self> {
        let mut fonts: Vec<Option<UnicodeFont>> = Vec::with_capacity(UNICODE_FONT_COUNT);
        for id in 0..UNICODE_FONT_COUNT {
            let font = match unifont_filename(id) {
                Some(name) => files.load_blob(&name)?,
                None => None,
            };
            fonts.push(font);
        }
        Ok(Self { fonts })
    }

    /// Font by id, if loaded
    pub fn get(&self, id: usize) -> Option<&UnicodeFont> {
        self.fonts.get(id).and_then(Option::as_ref)
    }

    /// Font by id
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the font is not loaded.
    pub fn require(&self, id: usize) -> Result<&UnicodeFont> {
        self.get(id).ok_or_else(|| {
            StorageError::NotFound(PathBuf::from(unifont_filename(id).unwrap_or_default()))
        })
    }

    /// Replace or remove a font
    pub fn set(&mut self, id: usize, font: Option<UnicodeFont>) {
        if id >= self.fonts.len() && id < UNICODE_FONT_COUNT {
            self.fonts.resize(id + 1, None);
        }
        if let Some(slot) = self.fonts.get_mut(id) {
            *slot = font;
        }
    }

    /// Number of loaded fonts
    pub fn loaded(&self) -> usize {
        self.fonts.iter().flatten().count()
    }

    /// Write every loaded font into `dir`, returning the files written
    ///
    /// Empty glyphs are not written, so they read back as absent.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (id, font) in self.fonts.iter().enumerate() {
            let (Some(font), Some(name)) = (font, unifont_filename(id)) else {
                continue;
            };
            let path = dir.as_ref().join(name);
            ClientFiles::save_blob(font, &path)?;
            written.push(path);
        }
        Ok(written)
    }
}
