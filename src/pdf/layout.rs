//! Pure layout arithmetic: cursor, table columns, page breaks.
//!
//! Nothing here touches a canvas, so the pagination rules can be checked
//! with plain numbers.

use super::canvas::{Align, PageGeometry};
use super::style::{
    HEADER_ROW_HEIGHT, ITEM_COL_WIDTH, QTY_COL_WIDTH, TAX_COL_WIDTH, TOTALS_ALLOWANCE,
    TOTAL_COL_WIDTH, UNIT_PRICE_COL_WIDTH,
};

/// Where the next thing gets drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
    pub page_index: usize,
}

impl CursorState {
    pub fn top_of_page(geometry: &PageGeometry, page_index: usize) -> Self {
        Self {
            x: geometry.margins.left,
            y: geometry.margins.top,
            page_index,
        }
    }

    pub fn advance(self, dy: f32) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }

    pub fn next_page(self, geometry: &PageGeometry) -> Self {
        Self::top_of_page(geometry, self.page_index + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Item,
    Tax,
    Quantity,
    UnitPrice,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub kind: ColumnKind,
    pub label: &'static str,
    pub x: f32,
    pub width: f32,
    pub align: Align,
}

/// Columns left to right starting at `left`. Without the tax column the
/// item column absorbs its width, so the table width never changes.
pub fn table_columns(left: f32, show_tax: bool) -> Vec<Column> {
    let item_width = if show_tax {
        ITEM_COL_WIDTH
    } else {
        ITEM_COL_WIDTH + TAX_COL_WIDTH
    };

    let mut defs = vec![(ColumnKind::Item, "Item", item_width, Align::Left)];
    if show_tax {
        defs.push((ColumnKind::Tax, "GST", TAX_COL_WIDTH, Align::Center));
    }
    defs.push((ColumnKind::Quantity, "Qty", QTY_COL_WIDTH, Align::Center));
    defs.push((ColumnKind::UnitPrice, "Unit Price", UNIT_PRICE_COL_WIDTH, Align::Right));
    defs.push((ColumnKind::Total, "Total", TOTAL_COL_WIDTH, Align::Right));

    let mut x = left;
    defs
        .into_iter()
        .map(|(kind, label, width, align)| {
            let column = Column {
                kind,
                label,
                x,
                width,
                align,
            };
            x += width;
            column
        })
        .collect()
}

pub fn table_width(columns: &[Column]) -> f32 {
    columns.iter().map(|c| c.width).sum()
}

/// Lowest y a table row may reach, leaving room for the totals block.
pub fn table_bottom_bound(geometry: &PageGeometry) -> f32 {
    geometry.printable_bottom() - TOTALS_ALLOWANCE
}

/// Tallest row that fits under a repeated header on an empty page. Taller
/// rows are cut down to this before placement.
pub fn max_row_height(geometry: &PageGeometry) -> f32 {
    table_bottom_bound(geometry) - geometry.margins.top - HEADER_ROW_HEIGHT
}

/// Outcome of placing one table row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPlacement {
    /// A new page must be started and the header redrawn at `header_top`.
    pub page_break: bool,
    pub header_top: Option<CursorState>,
    pub row_top: CursorState,
}

/// Places a row of `height` at `cursor`.
///
/// A row that does not fit moves to a new page below a repeated header.
/// The first row of a page always stays put; callers keep rows within
/// [`max_row_height`] so it fits.
pub fn place_row(
    cursor: CursorState,
    height: f32,
    geometry: &PageGeometry,
    page_has_rows: bool,
) -> RowPlacement {
    let bound = table_bottom_bound(geometry);
    if cursor.y + height <= bound || !page_has_rows {
        return RowPlacement {
            page_break: false,
            header_top: None,
            row_top: cursor,
        };
    }

    let header_top = cursor.next_page(geometry);
    RowPlacement {
        page_break: true,
        header_top: Some(header_top),
        row_top: header_top.advance(HEADER_ROW_HEIGHT),
    }
}

/// Decides whether the table header and its first row should start on a
/// new page, so a header is never left alone at the bottom of a page.
pub fn place_table_start(
    cursor: CursorState,
    first_row_height: Option<f32>,
    geometry: &PageGeometry,
) -> (bool, CursorState) {
    let bound = table_bottom_bound(geometry);
    let needed = HEADER_ROW_HEIGHT + first_row_height.unwrap_or(0.0);
    let fresh = cursor.next_page(geometry);
    if cursor.y + needed > bound && fresh.y + needed <= bound {
        (true, fresh)
    } else {
        (false, cursor)
    }
}

/// Runs [`place_row`] over all rows, starting just below the first header.
pub fn paginate_rows(start: CursorState, heights: &[f32], geometry: &PageGeometry) -> Vec<RowPlacement> {
    let mut cursor = start;
    let mut page_has_rows = false;
    let mut placements = Vec::with_capacity(heights.len());

    for &height in heights {
        let placement = place_row(cursor, height, geometry, page_has_rows);
        cursor = placement.row_top.advance(height);
        page_has_rows = true;
        placements.push(placement);
    }

    placements
}

/// Moves the totals block to a fresh page when it would not fit.
pub fn place_totals(cursor: CursorState, geometry: &PageGeometry, block_height: f32) -> (bool, CursorState) {
    if geometry.printable_bottom() - cursor.y < block_height {
        (true, cursor.next_page(geometry))
    } else {
        (false, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::style::{page_geometry, PAGE_MARGIN, TOTALS_BLOCK_HEIGHT};

    #[test]
    fn test_columns_are_contiguous() {
        let columns = table_columns(PAGE_MARGIN, true);
        for pair in columns.windows(2) {
            assert!((pair[0].x + pair[0].width - pair[1].x).abs() < 0.001);
        }
        assert_eq!(columns[0].align, Align::Left);
    }

    #[test]
    fn test_row_that_fits_stays() {
        let g = page_geometry();
        let cursor = CursorState::top_of_page(&g, 0).advance(100.0);
        let placement = place_row(cursor, 20.0, &g, true);
        assert!(!placement.page_break);
        assert_eq!(placement.row_top, cursor);
    }

    #[test]
    fn test_row_past_bound_breaks() {
        let g = page_geometry();
        let cursor = CursorState {
            x: g.margins.left,
            y: table_bottom_bound(&g) - 5.0,
            page_index: 0,
        };
        let placement = place_row(cursor, 20.0, &g, true);
        assert!(placement.page_break);
        let header = placement.header_top.unwrap();
        assert_eq!(header.page_index, 1);
        assert_eq!(header.y, g.margins.top);
        assert_eq!(placement.row_top.y, g.margins.top + HEADER_ROW_HEIGHT);
    }

    #[test]
    fn test_oversized_first_row_does_not_loop() {
        let g = page_geometry();
        let cursor = CursorState::top_of_page(&g, 3).advance(HEADER_ROW_HEIGHT);
        let placement = place_row(cursor, g.height * 2.0, &g, false);
        assert!(!placement.page_break);
    }

    #[test]
    fn test_max_height_row_fits_below_fresh_header() {
        let g = page_geometry();
        let header_top = CursorState::top_of_page(&g, 1);
        let row_top = header_top.advance(HEADER_ROW_HEIGHT);
        assert!(row_top.y + max_row_height(&g) <= table_bottom_bound(&g) + 0.001);
        assert!(max_row_height(&g) < g.printable_height());
    }

    #[test]
    fn test_table_start_moves_with_first_row() {
        let g = page_geometry();
        let low = CursorState {
            x: g.margins.left,
            y: table_bottom_bound(&g) - HEADER_ROW_HEIGHT - 5.0,
            page_index: 0,
        };
        let (moved, cursor) = place_table_start(low, Some(30.0), &g);
        assert!(moved);
        assert_eq!(cursor.page_index, 1);

        let (moved, _) = place_table_start(low, None, &g);
        assert!(!moved);
    }

    #[test]
    fn test_totals_move_when_short_on_space() {
        let g = page_geometry();
        let low = CursorState {
            x: g.margins.left,
            y: g.printable_bottom() - TOTALS_BLOCK_HEIGHT + 1.0,
            page_index: 2,
        };
        let (moved, cursor) = place_totals(low, &g, TOTALS_BLOCK_HEIGHT);
        assert!(moved);
        assert_eq!(cursor.page_index, 3);

        let high = CursorState::top_of_page(&g, 0);
        let (moved, cursor) = place_totals(high, &g, TOTALS_BLOCK_HEIGHT);
        assert!(!moved);
        assert_eq!(cursor, high);
    }
}
