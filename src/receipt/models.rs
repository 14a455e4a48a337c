use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of customer captured on the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    #[default]
    Individual,
    Business,
}

/// Seller identity copied into the receipt when it was created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SellerSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Australian Business Number or equivalent tax id.
    #[serde(default)]
    pub abn: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Customer identity copied into the receipt when it was created.
///
/// Business customers usually carry only `business_name`; individuals carry
/// `first_name`/`last_name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CustomerSnapshot {
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub abn: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
    #[serde(default)]
    pub tax_applicable: bool,
}

/// A fully computed receipt. Totals are trusted as given and never
/// recomputed during rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Receipt {
    pub receipt_id: i64,
    pub customer_id: i64,
    /// ISO-8601 purchase date, e.g. `2026-10-19` or `2026-10-19T09:30:00Z`.
    pub date_purchased: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub subtotal_excl_tax: f64,
    pub tax_amount: f64,
    pub total_incl_tax: f64,
    #[serde(default)]
    pub is_tax_invoice: bool,
    #[serde(default)]
    pub seller: SellerSnapshot,
    #[serde(default)]
    pub customer: CustomerSnapshot,
}

impl Receipt {
    /// The tax column and tax total line are only shown when tax was charged.
    pub fn has_tax(&self) -> bool {
        self.tax_amount > 0.0
    }
}
