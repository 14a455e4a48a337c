//! Self-contained HTML rendition of a receipt for the browser renderer.
//!
//! The markup lives in `templates/receipt.html`; askama escapes every
//! interpolated value. All styling is inline and the document references no
//! external resources. Pagination is left to the browser's print engine:
//! table headers repeat via `thead` and rows avoid page breaks.

use askama::Template;

use super::format;
use crate::receipt::{LineItem, Receipt};

pub struct Party {
    pub heading: &'static str,
    pub name: String,
    pub lines: Vec<String>,
}

pub struct ItemRow<'a> {
    pub name: &'a str,
    /// Empty when the item has none.
    pub description: &'a str,
    pub tax_flag: &'static str,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl<'a> ItemRow<'a> {
    fn from_item(item: &'a LineItem) -> Self {
        Self {
            name: format::item_name(item),
            description: format::item_description(item).unwrap_or_default(),
            tax_flag: format::tax_flag(item),
            quantity: item.quantity,
            unit_price: format::format_currency(item.unit_price),
            line_total: format::format_currency(item.line_total),
        }
    }
}

#[derive(Template)]
#[template(path = "receipt.html")]
pub struct ReceiptPage<'a> {
    pub title: &'static str,
    pub receipt_id: i64,
    pub customer_id: i64,
    pub seller_name: &'a str,
    pub parties: Vec<Party>,
    pub date: String,
    pub show_tax: bool,
    pub rows: Vec<ItemRow<'a>>,
    pub subtotal: String,
    pub tax_label: String,
    pub tax_amount: String,
    pub total: String,
}

impl<'a> ReceiptPage<'a> {
    pub fn new(receipt: &'a Receipt, tax_rate_percent: Option<f64>) -> Self {
        let seller_name = format::seller_name(&receipt.seller);
        Self {
            title: format::document_title(receipt),
            receipt_id: receipt.receipt_id,
            customer_id: receipt.customer_id,
            seller_name,
            parties: vec![
                Party {
                    heading: "From",
                    name: seller_name.to_string(),
                    lines: format::seller_lines(&receipt.seller, receipt.is_tax_invoice),
                },
                Party {
                    heading: "Bill To",
                    name: format::customer_name(&receipt.customer),
                    lines: format::customer_lines(&receipt.customer),
                },
            ],
            date: format::format_purchase_date(&receipt.date_purchased),
            show_tax: receipt.has_tax(),
            rows: receipt.line_items.iter().map(ItemRow::from_item).collect(),
            subtotal: format::format_currency(receipt.subtotal_excl_tax),
            tax_label: format::tax_label(receipt, tax_rate_percent),
            tax_amount: format::format_currency(receipt.tax_amount),
            total: format::format_currency(receipt.total_incl_tax),
        }
    }
}

/// Complete HTML document for `receipt`.
pub fn render_document(receipt: &Receipt, tax_rate_percent: Option<f64>) -> askama::Result<String> {
    ReceiptPage::new(receipt, tax_rate_percent).render()
}
