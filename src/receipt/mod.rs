//! Receipt model consumed by the PDF renderers.
//!
//! Receipts arrive fully computed (totals, snapshots, line items); this
//! module only describes their shape and sanity-checks incoming payloads.

pub mod models;
pub mod validation;

pub use models::{CustomerSnapshot, CustomerType, LineItem, Receipt, SellerSnapshot};
pub use validation::Validator;
