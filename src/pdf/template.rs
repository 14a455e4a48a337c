//! Receipt sections drawn onto a [`Canvas`].
//!
//! The generator calls the sections in [`Section::ORDER`]; each one starts
//! at the cursor the previous one left behind.

use std::fmt;

use log::{debug, warn};

use super::canvas::{Align, Canvas, CanvasError, Rgb, TextOptions};
use super::fonts::{FontChooser, Weight};
use super::format;
use super::layout::{self, Column, ColumnKind, CursorState};
use super::style::{
    line_height, BODY_SIZE, BRAND_COLOR, CELL_PADDING, FOOTER_OFFSET, FOOTER_SIZE,
    HEADER_ROW_HEIGHT, HEADING_SIZE, MUTED_COLOR, RULE_COLOR, RULE_THICK, RULE_THIN,
    SECTION_GAP, TABLE_SIZE, TEXT_COLOR, TITLE_SIZE, TOTALS_AMOUNT_WIDTH, TOTALS_BLOCK_HEIGHT,
    TOTALS_LABEL_WIDTH,
};
use crate::receipt::{LineItem, Receipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    SellerInfo,
    CustomerInfo,
    InvoiceMeta,
    LineItems,
    Totals,
    Footer,
}

impl Section {
    pub const ORDER: [Section; 7] = [
        Section::Header,
        Section::SellerInfo,
        Section::CustomerInfo,
        Section::InvoiceMeta,
        Section::LineItems,
        Section::Totals,
        Section::Footer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::SellerInfo => "seller info",
            Section::CustomerInfo => "customer info",
            Section::InvoiceMeta => "invoice metadata",
            Section::LineItems => "line items",
            Section::Totals => "totals",
            Section::Footer => "footer",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State shared by the sections of one document.
pub struct RenderContext<'a> {
    pub canvas: &'a mut dyn Canvas,
    pub cursor: CursorState,
    pub fonts: FontChooser,
    pub prefix: &'a str,
    pub tax_rate_percent: Option<f64>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        canvas: &'a mut dyn Canvas,
        fonts: FontChooser,
        prefix: &'a str,
        tax_rate_percent: Option<f64>,
    ) -> Self {
        let cursor = CursorState::top_of_page(canvas.geometry(), canvas.current_page());
        Self {
            canvas,
            cursor,
            fonts,
            prefix,
            tax_rate_percent,
        }
    }

    pub fn font(&mut self, weight: Weight, size: f32) -> Result<(), CanvasError> {
        self.fonts.select(&mut *self.canvas, weight, size)
    }

    pub fn content_width(&self) -> f32 {
        self.canvas.geometry().content_width()
    }

    /// Full-width text at the cursor; moves the cursor below it.
    pub fn write(&mut self, text: &str, align: Align) -> Result<(), CanvasError> {
        let width = self.content_width();
        let used = self
            .canvas
            .text(text, self.cursor.x, self.cursor.y, TextOptions::within(width, align))?;
        self.cursor = self.cursor.advance(used);
        Ok(())
    }

    pub fn rule(&mut self, thickness: f32, color: Rgb) -> Result<(), CanvasError> {
        let y = self.cursor.y;
        let left = self.cursor.x;
        let right = left + self.content_width();
        self.canvas.line((left, y), (right, y), thickness, color)
    }

    pub fn new_page(&mut self) -> Result<(), CanvasError> {
        self.canvas.add_page()?;
        self.cursor = self.cursor.next_page(self.canvas.geometry());
        Ok(())
    }
}

/// One way of drawing a receipt, section by section.
pub trait ReceiptTemplate: Send + Sync {
    fn header(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError>;
    fn seller_info(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError>;
    fn customer_info(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError>;
    fn invoice_meta(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError>;
    fn line_items(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError>;
    fn totals(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError>;
    fn footer(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError>;

    fn render_section(
        &self,
        section: Section,
        ctx: &mut RenderContext<'_>,
        receipt: &Receipt,
    ) -> Result<(), CanvasError> {
        match section {
            Section::Header => self.header(ctx, receipt),
            Section::SellerInfo => self.seller_info(ctx, receipt),
            Section::CustomerInfo => self.customer_info(ctx, receipt),
            Section::InvoiceMeta => self.invoice_meta(ctx, receipt),
            Section::LineItems => self.line_items(ctx, receipt),
            Section::Totals => self.totals(ctx, receipt),
            Section::Footer => self.footer(ctx, receipt),
        }
    }
}

/// Item cell content of one table row, measured.
struct RowCell {
    description: Option<String>,
    height: f32,
}

const ELLIPSIS: &str = "...";

/// The stock bakery receipt layout.
#[derive(Debug, Default, Clone)]
pub struct DefaultTemplate;

impl DefaultTemplate {
    fn block(
        &self,
        ctx: &mut RenderContext<'_>,
        heading: &str,
        name: &str,
        lines: &[String],
    ) -> Result<(), CanvasError> {
        ctx.font(Weight::Bold, HEADING_SIZE)?;
        ctx.canvas.set_fill_color(BRAND_COLOR);
        ctx.write(heading, Align::Left)?;

        ctx.font(Weight::Bold, BODY_SIZE)?;
        ctx.canvas.set_fill_color(TEXT_COLOR);
        ctx.write(name, Align::Left)?;

        ctx.font(Weight::Regular, BODY_SIZE)?;
        for line in lines {
            ctx.write(line, Align::Left)?;
        }
        ctx.cursor = ctx.cursor.advance(SECTION_GAP);
        Ok(())
    }

    fn table_header(&self, ctx: &mut RenderContext<'_>, columns: &[Column]) -> Result<(), CanvasError> {
        let top = ctx.cursor.y;
        ctx.font(Weight::Bold, TABLE_SIZE)?;
        ctx.canvas.set_fill_color(BRAND_COLOR);
        for column in columns {
            ctx.canvas.text(
                column.label,
                column.x + CELL_PADDING,
                top + CELL_PADDING,
                TextOptions::within(column.width - 2.0 * CELL_PADDING, column.align),
            )?;
        }
        let left = columns.first().map(|c| c.x).unwrap_or(ctx.cursor.x);
        let right = left + layout::table_width(columns);
        let rule_y = top + HEADER_ROW_HEIGHT - 2.0;
        ctx.canvas.line((left, rule_y), (right, rule_y), RULE_THICK, BRAND_COLOR)?;
        ctx.canvas.set_fill_color(TEXT_COLOR);
        ctx.cursor = ctx.cursor.advance(HEADER_ROW_HEIGHT);
        Ok(())
    }

    /// Measures the item cell. A description that would make the row taller
    /// than `max_height` keeps only the lines that fit and ends in an
    /// ellipsis.
    fn row_cell(
        &self,
        ctx: &mut RenderContext<'_>,
        item: &LineItem,
        item_width: f32,
        max_height: f32,
    ) -> Result<RowCell, CanvasError> {
        ctx.font(Weight::Bold, TABLE_SIZE)?;
        let name_height = ctx.canvas.height_of(format::item_name(item), item_width);
        let base = name_height + 2.0 * CELL_PADDING;

        let Some(description) = format::item_description(item) else {
            return Ok(RowCell {
                description: None,
                height: base,
            });
        };
        ctx.font(Weight::Regular, TABLE_SIZE)?;
        let lines = ctx.canvas.wrap(description, item_width);
        let step = line_height(TABLE_SIZE);
        let full = base + lines.len() as f32 * step;
        if full <= max_height {
            return Ok(RowCell {
                description: Some(description.to_string()),
                height: full,
            });
        }

        let keep = ((max_height - base) / step).floor().max(0.0) as usize;
        warn!(
            "{} description of '{}' cut to {} of {} lines to fit on one page",
            ctx.prefix,
            format::item_name(item),
            keep,
            lines.len()
        );
        let mut kept: Vec<String> = lines.into_iter().take(keep).collect();
        if let Some(last) = kept.last_mut() {
            *last = with_ellipsis(&*ctx.canvas, last, item_width);
        }
        Ok(RowCell {
            description: (!kept.is_empty()).then(|| kept.join("\n")),
            height: base + kept.len() as f32 * step,
        })
    }

    fn table_row(
        &self,
        ctx: &mut RenderContext<'_>,
        columns: &[Column],
        item: &LineItem,
        description: Option<&str>,
    ) -> Result<(), CanvasError> {
        let top = ctx.cursor.y + CELL_PADDING;
        for column in columns {
            let x = column.x + CELL_PADDING;
            let width = column.width - 2.0 * CELL_PADDING;
            let options = TextOptions::within(width, column.align);
            match column.kind {
                ColumnKind::Item => {
                    ctx.font(Weight::Bold, TABLE_SIZE)?;
                    let used = ctx.canvas.text(format::item_name(item), x, top, options)?;
                    if let Some(description) = description {
                        ctx.font(Weight::Regular, TABLE_SIZE)?;
                        ctx.canvas.set_fill_color(MUTED_COLOR);
                        ctx.canvas.text(description, x, top + used, options)?;
                        ctx.canvas.set_fill_color(TEXT_COLOR);
                    }
                }
                ColumnKind::Tax => {
                    ctx.font(Weight::Regular, TABLE_SIZE)?;
                    ctx.canvas.text(format::tax_flag(item), x, top, options)?;
                }
                ColumnKind::Quantity => {
                    ctx.font(Weight::Regular, TABLE_SIZE)?;
                    ctx.canvas.text(&item.quantity.to_string(), x, top, options)?;
                }
                ColumnKind::UnitPrice => {
                    ctx.font(Weight::Regular, TABLE_SIZE)?;
                    ctx.canvas.text(&format::format_currency(item.unit_price), x, top, options)?;
                }
                ColumnKind::Total => {
                    ctx.font(Weight::Regular, TABLE_SIZE)?;
                    ctx.canvas.text(&format::format_currency(item.line_total), x, top, options)?;
                }
            }
        }
        Ok(())
    }

    fn totals_row(
        &self,
        ctx: &mut RenderContext<'_>,
        label: &str,
        amount: f64,
        weight: Weight,
    ) -> Result<(), CanvasError> {
        let right = ctx.cursor.x + ctx.content_width();
        let amount_x = right - TOTALS_AMOUNT_WIDTH;
        let label_x = amount_x - TOTALS_LABEL_WIDTH;
        let size = if weight == Weight::Bold { HEADING_SIZE } else { BODY_SIZE };

        ctx.font(weight, size)?;
        ctx.canvas.text(
            label,
            label_x,
            ctx.cursor.y,
            TextOptions::within(TOTALS_LABEL_WIDTH, Align::Right),
        )?;
        let used = ctx.canvas.text(
            &format::format_currency(amount),
            amount_x,
            ctx.cursor.y,
            TextOptions::within(TOTALS_AMOUNT_WIDTH, Align::Right),
        )?;
        ctx.cursor = ctx.cursor.advance(used + 4.0);
        Ok(())
    }
}

/// `line` followed by an ellipsis, shortened until both fit on one line.
fn with_ellipsis(canvas: &dyn Canvas, line: &str, width: f32) -> String {
    let mut base = line.trim_end().to_string();
    loop {
        let candidate = format!("{}{}", base, ELLIPSIS);
        if base.is_empty() || canvas.wrap(&candidate, width).len() <= 1 {
            return candidate;
        }
        base.pop();
    }
}

impl ReceiptTemplate for DefaultTemplate {
    fn header(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError> {
        let top = ctx.cursor.y;
        let width = ctx.content_width();

        ctx.font(Weight::Bold, TITLE_SIZE)?;
        ctx.canvas.set_fill_color(BRAND_COLOR);
        let brand = ctx.canvas.text(
            format::seller_name(&receipt.seller),
            ctx.cursor.x,
            top,
            TextOptions::within(width * 0.6, Align::Left),
        )?;
        ctx.canvas.set_fill_color(TEXT_COLOR);
        let title = ctx.canvas.text(
            format::document_title(receipt),
            ctx.cursor.x,
            top,
            TextOptions::within(width, Align::Right),
        )?;

        ctx.cursor = ctx.cursor.advance(brand.max(title) + 6.0);
        ctx.rule(RULE_THICK, BRAND_COLOR)?;
        ctx.cursor = ctx.cursor.advance(SECTION_GAP);
        Ok(())
    }

    fn seller_info(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError> {
        let lines = format::seller_lines(&receipt.seller, receipt.is_tax_invoice);
        self.block(ctx, "From", format::seller_name(&receipt.seller), &lines)
    }

    fn customer_info(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError> {
        let name = format::customer_name(&receipt.customer);
        let lines = format::customer_lines(&receipt.customer);
        self.block(ctx, "Bill To", &name, &lines)
    }

    fn invoice_meta(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError> {
        ctx.font(Weight::Regular, BODY_SIZE)?;
        ctx.write(&format!("Invoice #: {}", receipt.receipt_id), Align::Left)?;
        ctx.write(
            &format!("Date: {}", format::format_purchase_date(&receipt.date_purchased)),
            Align::Left,
        )?;
        ctx.write(&format!("Customer ID: {}", receipt.customer_id), Align::Left)?;
        ctx.cursor = ctx.cursor.advance(SECTION_GAP);
        Ok(())
    }

    fn line_items(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError> {
        let geometry = *ctx.canvas.geometry();
        let columns = layout::table_columns(geometry.margins.left, receipt.has_tax());
        let item_width = columns[0].width - 2.0 * CELL_PADDING;
        let max_height = layout::max_row_height(&geometry);

        let cells = receipt
            .line_items
            .iter()
            .map(|item| self.row_cell(ctx, item, item_width, max_height))
            .collect::<Result<Vec<_>, _>>()?;

        let (page_break, _) =
            layout::place_table_start(ctx.cursor, cells.first().map(|c| c.height), &geometry);
        if page_break {
            ctx.new_page()?;
        }
        self.table_header(ctx, &columns)?;

        let heights: Vec<f32> = cells.iter().map(|c| c.height).collect();
        let placements = layout::paginate_rows(ctx.cursor, &heights, &geometry);
        for ((item, cell), placement) in receipt.line_items.iter().zip(&cells).zip(placements) {
            if let Some(header_top) = placement.header_top {
                debug!(
                    "{} table continues on page {}",
                    ctx.prefix,
                    header_top.page_index + 1
                );
                ctx.canvas.add_page()?;
                ctx.cursor = header_top;
                self.table_header(ctx, &columns)?;
            }

            ctx.cursor = placement.row_top;
            self.table_row(ctx, &columns, item, cell.description.as_deref())?;
            ctx.cursor = ctx.cursor.advance(cell.height);
        }

        let left = geometry.margins.left;
        let right = left + layout::table_width(&columns);
        ctx.canvas
            .line((left, ctx.cursor.y), (right, ctx.cursor.y), RULE_THIN, RULE_COLOR)?;
        ctx.cursor = ctx.cursor.advance(SECTION_GAP);
        Ok(())
    }

    fn totals(&self, ctx: &mut RenderContext<'_>, receipt: &Receipt) -> Result<(), CanvasError> {
        let geometry = *ctx.canvas.geometry();
        let (page_break, _) = layout::place_totals(ctx.cursor, &geometry, TOTALS_BLOCK_HEIGHT);
        if page_break {
            debug!("{} totals moved to a new page", ctx.prefix);
            ctx.new_page()?;
        }

        self.totals_row(ctx, "Subtotal", receipt.subtotal_excl_tax, Weight::Regular)?;
        if receipt.has_tax() {
            let label = format::tax_label(receipt, ctx.tax_rate_percent);
            self.totals_row(ctx, &label, receipt.tax_amount, Weight::Regular)?;
        }

        let right = ctx.cursor.x + ctx.content_width();
        let left = right - TOTALS_AMOUNT_WIDTH - TOTALS_LABEL_WIDTH;
        ctx.canvas
            .line((left, ctx.cursor.y), (right, ctx.cursor.y), RULE_THIN, TEXT_COLOR)?;
        ctx.cursor = ctx.cursor.advance(6.0);

        self.totals_row(ctx, "Total", receipt.total_incl_tax, Weight::Bold)
    }

    fn footer(&self, ctx: &mut RenderContext<'_>, _receipt: &Receipt) -> Result<(), CanvasError> {
        let geometry = *ctx.canvas.geometry();
        let last = ctx.canvas.current_page();
        let count = ctx.canvas.page_count();
        let y = geometry.printable_bottom() + FOOTER_OFFSET - line_height(FOOTER_SIZE);
        let width = geometry.content_width();

        ctx.font(Weight::Regular, FOOTER_SIZE)?;
        ctx.canvas.set_fill_color(MUTED_COLOR);
        for page in 0..count {
            ctx.canvas.switch_to_page(page)?;
            ctx.canvas.text(
                "Thank you for your business!",
                geometry.margins.left,
                y,
                TextOptions::within(width, Align::Left),
            )?;
            ctx.canvas.text(
                &format!("Page {} of {}", page + 1, count),
                geometry.margins.left,
                y,
                TextOptions::within(width, Align::Right),
            )?;
        }
        ctx.canvas.switch_to_page(last)?;
        ctx.canvas.set_fill_color(TEXT_COLOR);
        Ok(())
    }
}
