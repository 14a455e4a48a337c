//! Receipt PDF rendering.
//!
//! Two renderers produce the same file from a [`Receipt`]:
//! - [`PdfGenerator`] lays the receipt out on a paginated canvas and writes
//!   it with `printpdf`.
//! - [`BrowserRenderer`] builds an HTML page and prints it through a
//!   WebDriver-controlled headless browser.
//!
//! Both return a [`GenerationResult`] and never leave a partial file behind.

pub mod browser;
pub mod buffered;
pub mod canvas;
pub mod fonts;
pub mod format;
pub mod generator;
pub mod html;
pub mod layout;
pub mod metrics;
pub mod output;
pub mod style;
pub mod template;
pub mod traits;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use browser::{BrowserRenderer, WebDriverLauncher};
pub use canvas::CanvasError;
pub use generator::{GeneratorConfig, PdfGenerator};
pub use template::{DefaultTemplate, ReceiptTemplate, Section};
pub use traits::Renderer;

use crate::config::{AppConfig, RendererKind};
use crate::receipt::Receipt;

/// Errors that can occur while producing a receipt PDF.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to initialize document: {0}")]
    CanvasInit(#[source] CanvasError),
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open output file: {0}")]
    OpenStream(#[source] std::io::Error),
    #[error("failed to render {section}: {source}")]
    Section {
        section: Section,
        #[source]
        source: CanvasError,
    },
    #[error("failed to finalize document: {0}")]
    Finalize(#[source] CanvasError),
    #[error("document encoding task did not complete: {0}")]
    FinalizeJoin(#[source] tokio::task::JoinError),
    #[error("failed to write output file: {0}")]
    Stream(#[source] std::io::Error),
    #[error("document was already finalized")]
    AlreadyFinalized,
    #[error("failed to render receipt HTML: {0}")]
    Template(#[source] askama::Error),
    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),
    #[error("failed to load receipt HTML: {0}")]
    ContentInjection(String),
    #[error("failed to print PDF: {0}")]
    Rasterize(String),
}

/// Outcome of one generation call, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl GenerationResult {
    pub fn succeeded(path: &Path) -> Self {
        Self {
            success: true,
            message: None,
            file_path: Some(path.display().to_string()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            file_path: None,
        }
    }
}

/// Build the renderer selected in the configuration.
pub fn build_renderer(config: &AppConfig) -> Arc<dyn Renderer> {
    match config.renderer {
        RendererKind::Canvas => Arc::new(PdfGenerator::new(GeneratorConfig::from_app(config))),
        RendererKind::Browser => Arc::new(BrowserRenderer::new(
            config.pdf_output_dir.clone(),
            config.tax_rate_percent,
            Arc::new(WebDriverLauncher::new(
                config.webdriver_path.clone(),
                config.webdriver_port,
            )),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serialization_uses_camel_case() {
        let ok = GenerationResult::succeeded(Path::new("receipts/42.pdf"));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["filePath"], "receipts/42.pdf");
        assert!(json.get("message").is_none());

        let failed = GenerationResult::failed("boom");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["message"], "boom");
        assert!(json.get("filePath").is_none());
    }

    #[test]
    fn test_section_error_message_names_section() {
        let err = GenerationError::Section {
            section: Section::Totals,
            source: CanvasError::NoFontSelected,
        };
        assert_eq!(
            err.to_string(),
            "failed to render totals: no font selected before drawing text"
        );
    }
}
