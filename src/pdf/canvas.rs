//! Paginated drawing surface used by the receipt template.
//!
//! The canvas is positional: callers pass explicit coordinates and keep the
//! vertical cursor themselves (see [`super::layout::CursorState`]). Text
//! drawing and measurement use whatever font was last selected.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::fonts::FontFiles;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("font '{font}' is unavailable: {reason}")]
    FontUnavailable { font: String, reason: String },
    #[error("no usable font: primary '{primary}' and fallback '{fallback}' both failed ({reason})")]
    FontsExhausted {
        primary: String,
        fallback: String,
        reason: String,
    },
    #[error("no font selected before drawing text")]
    NoFontSelected,
    #[error("invalid page setup: {0}")]
    InvalidPage(String),
    #[error("page {index} does not exist (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("failed to encode document: {0}")]
    Encode(String),
}

/// Typefaces the canvas knows how to register.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
    /// A TrueType file registered on first use.
    TrueType { name: String, path: PathBuf },
}

impl FontFace {
    pub fn name(&self) -> &str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
            FontFace::Courier => "Courier",
            FontFace::CourierBold => "Courier-Bold",
            FontFace::TrueType { name, .. } => name,
        }
    }

    pub fn is_monospace(&self) -> bool {
        matches!(self, FontFace::Courier | FontFace::CourierBold)
    }
}

impl fmt::Display for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Lowest y that content may reach.
    pub fn printable_bottom(&self) -> f32 {
        self.height - self.margins.bottom
    }

    pub fn printable_height(&self) -> f32 {
        self.printable_bottom() - self.margins.top
    }

    pub fn validate(&self) -> Result<(), CanvasError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(CanvasError::InvalidPage(format!(
                "page size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if self.content_width() <= 0.0 || self.printable_height() <= 0.0 {
            return Err(CanvasError::InvalidPage(
                "margins leave no printable area".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for a single text draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions {
    /// Wrap and align within this width. Without it the text is drawn on
    /// one line starting at `x`.
    pub width: Option<f32>,
    pub align: Align,
}

impl TextOptions {
    pub fn within(width: f32, align: Align) -> Self {
        Self {
            width: Some(width),
            align,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CanvasOptions {
    pub title: String,
    /// Keep every page addressable until the document is finished.
    pub buffer_pages: bool,
    /// Bytes of any TrueType faces the canvas may be asked to register.
    pub font_files: FontFiles,
}

pub trait Canvas: Send {
    fn geometry(&self) -> &PageGeometry;

    fn select_font(&mut self, face: &FontFace, size: f32) -> Result<(), CanvasError>;

    fn set_fill_color(&mut self, color: Rgb);

    /// Draws text with its top edge at `y` and returns the height used.
    fn text(&mut self, text: &str, x: f32, y: f32, options: TextOptions) -> Result<f32, CanvasError>;

    /// Height `text` would take when wrapped to `width` with the current font.
    fn height_of(&self, text: &str, width: f32) -> f32;

    /// Lines `text` wraps to at `width` with the current font.
    fn wrap(&self, text: &str, width: f32) -> Vec<String>;

    fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgb) -> Result<(), CanvasError>;

    fn add_page(&mut self) -> Result<(), CanvasError>;

    fn page_count(&self) -> usize;

    fn current_page(&self) -> usize;

    /// Only valid for buffered canvases.
    fn switch_to_page(&mut self, index: usize) -> Result<(), CanvasError>;

    /// Ends the document and returns the encoded bytes.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, CanvasError>;
}

pub trait CanvasFactory: Send + Sync {
    fn create(&self, geometry: PageGeometry, options: CanvasOptions) -> Result<Box<dyn Canvas>, CanvasError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_rejects_oversized_margins() {
        let geometry = PageGeometry {
            width: 100.0,
            height: 100.0,
            margins: Margins::uniform(60.0),
        };
        assert!(matches!(geometry.validate(), Err(CanvasError::InvalidPage(_))));
    }

    #[test]
    fn test_font_names() {
        assert_eq!(FontFace::HelveticaBold.name(), "Helvetica-Bold");
        let custom = FontFace::TrueType {
            name: "Inter".to_string(),
            path: PathBuf::from("/nope/inter.ttf"),
        };
        assert_eq!(custom.to_string(), "Inter");
        assert!(FontFace::Courier.is_monospace());
    }
}
