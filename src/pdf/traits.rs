//! Common interface of the receipt renderers.

use std::path::PathBuf;

use async_trait::async_trait;

use super::GenerationResult;
use crate::receipt::Receipt;

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short name for logs and health output.
    fn name(&self) -> &'static str;

    /// Where the PDF for `receipt_id` is written.
    fn output_path(&self, receipt_id: i64) -> PathBuf;

    /// Render `receipt` to its output path. `operation_id` only tags log
    /// lines.
    async fn render(&self, receipt: &Receipt, operation_id: &str) -> GenerationResult;
}
