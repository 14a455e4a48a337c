//! `printpdf` backend that buffers every page until the document ends.
//!
//! Drawing calls are recorded per page as a display list so earlier pages
//! stay editable (page numbers are stamped after the body is laid out).
//! The PDF itself is only built in [`Canvas::finish`].

use std::collections::HashMap;
use std::io::BufWriter;
use std::sync::Arc;

use printpdf::{BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, Point};

use super::canvas::{
    Align, Canvas, CanvasError, CanvasFactory, CanvasOptions, FontFace, PageGeometry, Rgb,
    TextOptions,
};
use super::fonts::FontFiles;
use super::metrics::{text_width, wrap_lines, GlyphMetrics, OutlineMetrics};
use super::style::{line_height, TEXT_COLOR};

/// Baseline offset below the top of a line box, as a fraction of font size.
const ASCENT: f32 = 0.8;

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(rgb.0, rgb.1, rgb.2, None))
}

enum FontSource {
    Builtin(BuiltinFont),
    External(Arc<Vec<u8>>),
}

struct RegisteredFont {
    face: FontFace,
    source: FontSource,
    metrics: GlyphMetrics,
}

enum DrawOp {
    Text {
        text: String,
        x: f32,
        baseline: f32,
        size: f32,
        font: usize,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgb,
    },
}

#[derive(Default)]
struct BufferedPage {
    ops: Vec<DrawOp>,
}

pub struct BufferedCanvas {
    title: String,
    geometry: PageGeometry,
    buffer_pages: bool,
    pages: Vec<BufferedPage>,
    current: usize,
    font_files: FontFiles,
    fonts: Vec<RegisteredFont>,
    font_index: HashMap<FontFace, usize>,
    active: Option<(usize, f32)>,
    fill: Rgb,
}

impl BufferedCanvas {
    pub fn new(geometry: PageGeometry, options: CanvasOptions) -> Result<Self, CanvasError> {
        geometry.validate()?;
        Ok(Self {
            title: options.title,
            geometry,
            buffer_pages: options.buffer_pages,
            pages: vec![BufferedPage::default()],
            current: 0,
            font_files: options.font_files,
            fonts: Vec::new(),
            font_index: HashMap::new(),
            active: None,
            fill: TEXT_COLOR,
        })
    }

    fn register(&mut self, face: &FontFace) -> Result<usize, CanvasError> {
        if let Some(&index) = self.font_index.get(face) {
            return Ok(index);
        }

        let builtin = |font| (FontSource::Builtin(font), GlyphMetrics::Standard(face.clone()));
        let (source, metrics) = match face {
            FontFace::Helvetica => builtin(BuiltinFont::Helvetica),
            FontFace::HelveticaBold => builtin(BuiltinFont::HelveticaBold),
            FontFace::Courier => builtin(BuiltinFont::Courier),
            FontFace::CourierBold => builtin(BuiltinFont::CourierBold),
            FontFace::TrueType { path, .. } => {
                let bytes = self
                    .font_files
                    .get(path)
                    .map_err(|reason| unavailable(face, reason))?;
                let outline = OutlineMetrics::from_bytes(bytes.to_vec()).ok_or_else(|| {
                    unavailable(
                        face,
                        format!("{} is not a TrueType/OpenType file", path.display()),
                    )
                })?;
                (FontSource::External(bytes), GlyphMetrics::Outline(outline))
            }
        };

        let index = self.fonts.len();
        self.fonts.push(RegisteredFont {
            face: face.clone(),
            source,
            metrics,
        });
        self.font_index.insert(face.clone(), index);
        Ok(index)
    }

    fn active_metrics(&self) -> Option<(&GlyphMetrics, f32)> {
        self.active
            .map(|(index, size)| (&self.fonts[index].metrics, size))
    }
}

fn unavailable(face: &FontFace, reason: String) -> CanvasError {
    CanvasError::FontUnavailable {
        font: face.name().to_string(),
        reason,
    }
}

impl Canvas for BufferedCanvas {
    fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn select_font(&mut self, face: &FontFace, size: f32) -> Result<(), CanvasError> {
        let index = self.register(face)?;
        self.active = Some((index, size));
        Ok(())
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.fill = color;
    }

    fn text(&mut self, text: &str, x: f32, y: f32, options: TextOptions) -> Result<f32, CanvasError> {
        let (font, size) = self.active.ok_or(CanvasError::NoFontSelected)?;
        let metrics = &self.fonts[font].metrics;
        let step = line_height(size);

        let lines = match options.width {
            Some(width) => wrap_lines(metrics, size, text, width),
            None => vec![text.to_string()],
        };

        let count = lines.len();
        let mut top = y;
        for line in lines {
            let line_x = match (options.width, options.align) {
                (Some(width), Align::Center) => x + (width - text_width(metrics, size, &line)) / 2.0,
                (Some(width), Align::Right) => x + width - text_width(metrics, size, &line),
                _ => x,
            };
            if !line.is_empty() {
                self.pages[self.current].ops.push(DrawOp::Text {
                    text: line,
                    x: line_x,
                    baseline: top + size * ASCENT,
                    size,
                    font,
                    color: self.fill,
                });
            }
            top += step;
        }

        Ok(count as f32 * step)
    }

    fn height_of(&self, text: &str, width: f32) -> f32 {
        match self.active_metrics() {
            Some((metrics, size)) => wrap_lines(metrics, size, text, width).len() as f32 * line_height(size),
            None => 0.0,
        }
    }

    fn wrap(&self, text: &str, width: f32) -> Vec<String> {
        match self.active_metrics() {
            Some((metrics, size)) => wrap_lines(metrics, size, text, width),
            None => vec![text.to_string()],
        }
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgb) -> Result<(), CanvasError> {
        self.pages[self.current].ops.push(DrawOp::Line {
            from,
            to,
            thickness,
            color,
        });
        Ok(())
    }

    fn add_page(&mut self) -> Result<(), CanvasError> {
        self.pages.push(BufferedPage::default());
        self.current = self.pages.len() - 1;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current_page(&self) -> usize {
        self.current
    }

    fn switch_to_page(&mut self, index: usize) -> Result<(), CanvasError> {
        let count = self.pages.len();
        if index >= count || (!self.buffer_pages && index != count - 1) {
            return Err(CanvasError::PageOutOfRange { index, count });
        }
        self.current = index;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, CanvasError> {
        let width = mm(self.geometry.width);
        let height = mm(self.geometry.height);
        let page_height = self.geometry.height;

        let (doc, first_page, first_layer) = PdfDocument::new(&self.title, width, height, "Layer 1");

        let mut font_refs: Vec<IndirectFontRef> = Vec::with_capacity(self.fonts.len());
        for font in &self.fonts {
            let registered = match &font.source {
                FontSource::Builtin(builtin) => doc.add_builtin_font(builtin.clone()),
                FontSource::External(bytes) => doc.add_external_font(bytes.as_slice()),
            }
            .map_err(|e| CanvasError::Encode(format!("font '{}': {}", font.face, e)))?;
            font_refs.push(registered);
        }

        for (index, page) in self.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (p, l) = doc.add_page(width, height, "Layer 1");
                doc.get_page(p).get_layer(l)
            };

            for op in &page.ops {
                match op {
                    DrawOp::Text {
                        text,
                        x,
                        baseline,
                        size,
                        font,
                        color: fill,
                    } => {
                        layer.set_fill_color(color(*fill));
                        layer.use_text(
                            text.clone(),
                            *size,
                            mm(*x),
                            mm(page_height - baseline),
                            &font_refs[*font],
                        );
                    }
                    DrawOp::Line {
                        from,
                        to,
                        thickness,
                        color: stroke,
                    } => {
                        layer.set_outline_color(color(*stroke));
                        layer.set_outline_thickness(*thickness);
                        layer.add_line(Line {
                            points: vec![
                                (Point::new(mm(from.0), mm(page_height - from.1)), false),
                                (Point::new(mm(to.0), mm(page_height - to.1)), false),
                            ],
                            is_closed: false,
                        });
                    }
                }
            }
        }

        let mut writer = BufWriter::new(Vec::<u8>::new());
        doc.save(&mut writer)
            .map_err(|e| CanvasError::Encode(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| CanvasError::Encode(e.to_string()))
    }
}

/// Creates [`BufferedCanvas`] instances.
#[derive(Debug, Default, Clone)]
pub struct PrintPdfCanvasFactory;

impl CanvasFactory for PrintPdfCanvasFactory {
    fn create(&self, geometry: PageGeometry, options: CanvasOptions) -> Result<Box<dyn Canvas>, CanvasError> {
        Ok(Box::new(BufferedCanvas::new(geometry, options)?))
    }
}
