//! Glyph metrics for line breaking.
//!
//! The standard 14 fonts are not embedded, so there is no font program to
//! query: their widths come from an approximate table that only needs to be
//! close enough for wrapped lines to stay inside their cell. TrueType faces
//! are measured from the advance widths in the font file itself.

use rusttype::{Font, Scale};

use super::canvas::FontFace;

/// Advance widths of a parsed TrueType/OpenType font, in em units.
#[derive(Clone)]
pub struct OutlineMetrics {
    font: Font<'static>,
    /// rusttype scales glyphs by pixel height (ascent - descent); this
    /// converts one such pixel back to em units.
    em_per_pixel: f32,
}

impl OutlineMetrics {
    /// `None` when the bytes are not a font rusttype can read.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let font = Font::try_from_vec(bytes)?;
        let units_per_em = f32::from(font.units_per_em());
        let v = font.v_metrics_unscaled();
        let height = v.ascent - v.descent;
        if units_per_em <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(Self {
            font,
            em_per_pixel: height / units_per_em,
        })
    }

    fn char_width_em(&self, ch: char) -> f32 {
        let advance = self
            .font
            .glyph(ch)
            .scaled(Scale::uniform(1.0))
            .h_metrics()
            .advance_width;
        advance * self.em_per_pixel
    }
}

/// Width source for one registered face.
#[derive(Clone)]
pub enum GlyphMetrics {
    Standard(FontFace),
    Outline(OutlineMetrics),
}

impl GlyphMetrics {
    fn char_width_em(&self, ch: char) -> f32 {
        match self {
            GlyphMetrics::Standard(face) => standard_width_em(face, ch),
            GlyphMetrics::Outline(outline) => outline.char_width_em(ch),
        }
    }
}

fn standard_width_em(face: &FontFace, ch: char) -> f32 {
    if face.is_monospace() {
        return 0.6;
    }
    let base = match ch {
        ' ' | 'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.278,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | '/' => 0.333,
        'm' | 'w' => 0.833,
        'M' | 'W' | '@' => 0.9,
        '0'..='9' | '$' => 0.556,
        c if c.is_ascii_uppercase() => 0.667,
        _ => 0.556,
    };
    match face {
        FontFace::HelveticaBold => base * 1.06,
        _ => base,
    }
}

pub fn text_width(metrics: &GlyphMetrics, size: f32, text: &str) -> f32 {
    text.chars().map(|ch| metrics.char_width_em(ch)).sum::<f32>() * size
}

/// Greedy word wrap. Explicit newlines are kept; words longer than the
/// width are broken by character.
pub fn wrap_lines(metrics: &GlyphMetrics, size: f32, text: &str, width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(metrics, size, &candidate) <= width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(metrics, size, word) <= width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    let mut next = current.clone();
                    next.push(ch);
                    if !current.is_empty() && text_width(metrics, size, &next) > width {
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    } else {
                        current = next;
                    }
                }
            }
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_FONTS: [&str; 3] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
    ];

    fn helvetica() -> GlyphMetrics {
        GlyphMetrics::Standard(FontFace::Helvetica)
    }

    #[test]
    fn test_short_text_stays_on_one_line() {
        let lines = wrap_lines(&helvetica(), 10.0, "Croissant", 200.0);
        assert_eq!(lines, vec!["Croissant".to_string()]);
    }

    #[test]
    fn test_wraps_on_word_boundaries() {
        let text = "Rye sourdough loaf with caraway seeds and a dark crust";
        let lines = wrap_lines(&helvetica(), 10.0, text, 80.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(&helvetica(), 10.0, line) <= 80.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_long_word_is_split() {
        let courier = GlyphMetrics::Standard(FontFace::Courier);
        let lines = wrap_lines(&courier, 10.0, "Pumpernickelbrotchenmischung", 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "Pumpernickelbrotchenmischung");
    }

    #[test]
    fn test_newlines_are_kept() {
        let lines = wrap_lines(&helvetica(), 10.0, "Bagel\nSesame", 300.0);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_non_font_bytes_are_rejected() {
        assert!(OutlineMetrics::from_bytes(b"definitely not a font".to_vec()).is_none());
        assert!(OutlineMetrics::from_bytes(Vec::new()).is_none());
    }

    #[test]
    fn test_truetype_widths_come_from_the_font() {
        let Some(bytes) = SYSTEM_FONTS.iter().find_map(|p| std::fs::read(p).ok()) else {
            return;
        };
        let outline = GlyphMetrics::Outline(OutlineMetrics::from_bytes(bytes).unwrap());

        let narrow = text_width(&outline, 10.0, "iiii");
        let wide = text_width(&outline, 10.0, "WWWW");
        assert!(narrow > 0.0);
        assert!(wide > narrow * 2.0);
        // DejaVu Sans is wider than the Helvetica table.
        assert!(text_width(&outline, 10.0, "Sourdough") > text_width(&helvetica(), 10.0, "Sourdough"));
    }
}
