//! Formatting helpers shared by the canvas template and the HTML renderer.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::receipt::{CustomerSnapshot, CustomerType, LineItem, Receipt, SellerSnapshot};

/// Shown wherever a field is missing.
pub const PLACEHOLDER: &str = "N/A";

/// Trimmed value, or `None` when absent or blank.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn or_placeholder(value: Option<&str>) -> &str {
    present(value).unwrap_or(PLACEHOLDER)
}

/// Format an amount as dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Parse the purchase date from an RFC 3339 timestamp, a naive timestamp or
/// a plain `YYYY-MM-DD` date.
pub fn parse_purchase_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Human date such as `19 October 2026`; unparseable input is shown as-is.
pub fn format_purchase_date(value: &str) -> String {
    match parse_purchase_date(value) {
        Some(date) => date.format("%-d %B %Y").to_string(),
        None => or_placeholder(Some(value)).to_string(),
    }
}

pub fn document_title(receipt: &Receipt) -> &'static str {
    if receipt.is_tax_invoice {
        "TAX INVOICE"
    } else {
        "INVOICE"
    }
}

pub fn seller_name(seller: &SellerSnapshot) -> &str {
    or_placeholder(seller.name.as_deref())
}

fn person_name(customer: &CustomerSnapshot) -> Option<String> {
    let parts: Vec<&str> = [customer.first_name.as_deref(), customer.last_name.as_deref()]
        .into_iter()
        .filter_map(present)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Business customers show the business name; individuals show their full
/// name. Either falls back to whatever the snapshot does carry.
pub fn customer_name(customer: &CustomerSnapshot) -> String {
    let business = present(customer.business_name.as_deref()).map(str::to_string);
    let name = match customer.customer_type {
        CustomerType::Business => business.or_else(|| person_name(customer)),
        CustomerType::Individual => person_name(customer).or(business),
    };
    name.unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Contact lines that are present, labelled.
pub fn contact_lines(
    address: Option<&str>,
    abn: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(address) = present(address) {
        lines.push(address.to_string());
    }
    if let Some(abn) = present(abn) {
        lines.push(format!("ABN: {}", abn));
    }
    if let Some(email) = present(email) {
        lines.push(email.to_string());
    }
    if let Some(phone) = present(phone) {
        lines.push(format!("Ph: {}", phone));
    }
    lines
}

pub fn seller_lines(seller: &SellerSnapshot, tax_invoice: bool) -> Vec<String> {
    let mut lines = contact_lines(
        seller.address.as_deref(),
        seller.abn.as_deref(),
        seller.email.as_deref(),
        seller.phone.as_deref(),
    );
    // A tax invoice must show the seller's ABN even when it was not captured.
    if tax_invoice && present(seller.abn.as_deref()).is_none() {
        lines.push(format!("ABN: {}", PLACEHOLDER));
    }
    lines
}

pub fn customer_lines(customer: &CustomerSnapshot) -> Vec<String> {
    contact_lines(
        customer.address.as_deref(),
        customer.abn.as_deref(),
        customer.email.as_deref(),
        customer.phone.as_deref(),
    )
}

pub fn item_name(item: &LineItem) -> &str {
    or_placeholder(item.product_name.as_deref())
}

pub fn item_description(item: &LineItem) -> Option<&str> {
    present(item.description.as_deref())
}

pub fn tax_flag(item: &LineItem) -> &'static str {
    if item.tax_applicable {
        "Yes"
    } else {
        "-"
    }
}

/// Tax line label. A configured rate wins; otherwise the rate is derived
/// from the receipt's own amounts.
pub fn tax_label(receipt: &Receipt, configured_rate: Option<f64>) -> String {
    let rate = configured_rate.or_else(|| {
        (receipt.subtotal_excl_tax > 0.0).then(|| receipt.tax_amount / receipt.subtotal_excl_tax * 100.0)
    });
    match rate {
        Some(rate) => format!("GST ({}%)", format_rate(rate)),
        None => "GST".to_string(),
    }
}

fn format_rate(rate: f64) -> String {
    let rounded = (rate * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}
