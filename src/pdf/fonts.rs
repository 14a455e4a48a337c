//! Primary/fallback font selection.
//!
//! The primary face is tried first; when the canvas cannot provide it the
//! monospace fallback is used for the rest of the job and a single warning
//! is logged. Only a failing fallback is an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;

use super::canvas::{Canvas, CanvasError, FontFace};
use super::style::{FALLBACK_FONT, FALLBACK_FONT_BOLD, PRIMARY_FONT, PRIMARY_FONT_BOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Faces used by one renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSet {
    pub primary: FontFace,
    pub primary_bold: FontFace,
    pub fallback: FontFace,
    pub fallback_bold: FontFace,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            primary: PRIMARY_FONT,
            primary_bold: PRIMARY_FONT_BOLD,
            fallback: FALLBACK_FONT,
            fallback_bold: FALLBACK_FONT_BOLD,
        }
    }
}

impl FontSet {
    /// Use a TrueType file as the primary face for both weights.
    pub fn with_primary_file(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("custom")
            .to_string();
        let face = FontFace::TrueType { name, path };
        Self {
            primary: face.clone(),
            primary_bold: face,
            ..Self::default()
        }
    }

    pub fn faces(&self) -> [&FontFace; 4] {
        [&self.primary, &self.primary_bold, &self.fallback, &self.fallback_bold]
    }

    fn primary_for(&self, weight: Weight) -> &FontFace {
        match weight {
            Weight::Regular => &self.primary,
            Weight::Bold => &self.primary_bold,
        }
    }

    fn fallback_for(&self, weight: Weight) -> &FontFace {
        match weight {
            Weight::Regular => &self.fallback,
            Weight::Bold => &self.fallback_bold,
        }
    }
}

/// TrueType files read ahead of layout, keyed by path, so the canvas never
/// touches the filesystem. A failed read keeps its error text.
#[derive(Debug, Clone, Default)]
pub struct FontFiles {
    files: HashMap<PathBuf, Result<Arc<Vec<u8>>, String>>,
}

impl FontFiles {
    pub async fn load(fonts: &FontSet) -> Self {
        let mut files = HashMap::new();
        for face in fonts.faces() {
            let FontFace::TrueType { path, .. } = face else {
                continue;
            };
            if files.contains_key(path) {
                continue;
            }
            let loaded = tokio::fs::read(path)
                .await
                .map(Arc::new)
                .map_err(|e| format!("{}: {}", path.display(), e));
            files.insert(path.clone(), loaded);
        }
        Self { files }
    }

    pub fn get(&self, path: &Path) -> Result<Arc<Vec<u8>>, String> {
        match self.files.get(path) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(reason)) => Err(reason.clone()),
            None => Err(format!("{} was not loaded", path.display())),
        }
    }
}

/// Per-job font selector.
pub struct FontChooser {
    fonts: FontSet,
    prefix: String,
    primary_failed: bool,
}

impl FontChooser {
    pub fn new(fonts: FontSet, prefix: impl Into<String>) -> Self {
        Self {
            fonts,
            prefix: prefix.into(),
            primary_failed: false,
        }
    }

    pub fn using_fallback(&self) -> bool {
        self.primary_failed
    }

    pub fn select(&mut self, canvas: &mut dyn Canvas, weight: Weight, size: f32) -> Result<(), CanvasError> {
        let fallback = self.fonts.fallback_for(weight);

        if !self.primary_failed {
            let primary = self.fonts.primary_for(weight);
            match canvas.select_font(primary, size) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "{} font '{}' failed to load ({}); falling back to '{}'",
                        self.prefix, primary, e, fallback
                    );
                    self.primary_failed = true;
                }
            }
        }

        canvas
            .select_font(fallback, size)
            .map_err(|e| CanvasError::FontsExhausted {
                primary: self.fonts.primary_for(weight).to_string(),
                fallback: fallback.to_string(),
                reason: e.to_string(),
            })
    }
}
