//! Geometry and typography for the receipt layout.
//!
//! All lengths are PDF points measured from the top-left corner of the page.

use super::canvas::{FontFace, Margins, PageGeometry, Rgb};

/// A4 portrait.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const PAGE_MARGIN: f32 = 50.0;

pub const PRIMARY_FONT: FontFace = FontFace::Helvetica;
pub const PRIMARY_FONT_BOLD: FontFace = FontFace::HelveticaBold;
pub const FALLBACK_FONT: FontFace = FontFace::Courier;
pub const FALLBACK_FONT_BOLD: FontFace = FontFace::CourierBold;

pub const TITLE_SIZE: f32 = 20.0;
pub const HEADING_SIZE: f32 = 11.0;
pub const BODY_SIZE: f32 = 10.0;
pub const TABLE_SIZE: f32 = 9.0;
pub const FOOTER_SIZE: f32 = 8.0;

/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;

pub const SECTION_GAP: f32 = 14.0;
pub const CELL_PADDING: f32 = 4.0;
pub const HEADER_ROW_HEIGHT: f32 = 20.0;
pub const RULE_THIN: f32 = 0.5;
pub const RULE_THICK: f32 = 1.0;

// Table columns, left to right. Widths sum to the printable width.
pub const ITEM_COL_WIDTH: f32 = 225.28;
pub const TAX_COL_WIDTH: f32 = 50.0;
pub const QTY_COL_WIDTH: f32 = 50.0;
pub const UNIT_PRICE_COL_WIDTH: f32 = 85.0;
pub const TOTAL_COL_WIDTH: f32 = 85.0;

/// Height needed by the totals block (subtotal, tax, rule, grand total).
pub const TOTALS_BLOCK_HEIGHT: f32 = 80.0;
/// Space kept free under the last table row on every page so the totals
/// block never has to overlap a row.
pub const TOTALS_ALLOWANCE: f32 = TOTALS_BLOCK_HEIGHT + SECTION_GAP;
pub const TOTALS_LABEL_WIDTH: f32 = 130.0;
pub const TOTALS_AMOUNT_WIDTH: f32 = 90.0;

/// Footer baseline sits inside the bottom margin.
pub const FOOTER_OFFSET: f32 = 20.0;

pub const BRAND_COLOR: Rgb = Rgb(0.55, 0.27, 0.07);
pub const TEXT_COLOR: Rgb = Rgb(0.13, 0.13, 0.13);
pub const MUTED_COLOR: Rgb = Rgb(0.45, 0.45, 0.45);
pub const RULE_COLOR: Rgb = Rgb(0.75, 0.75, 0.75);

pub fn page_geometry() -> PageGeometry {
    PageGeometry {
        width: PAGE_WIDTH,
        height: PAGE_HEIGHT,
        margins: Margins::uniform(PAGE_MARGIN),
    }
}

pub fn line_height(size: f32) -> f32 {
    size * LINE_SPACING
}
