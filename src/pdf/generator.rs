//! Canvas-based receipt generator.
//!
//! Each call to [`PdfGenerator::generate`] owns a fresh [`GenerationJob`];
//! the generator itself holds only configuration, so concurrent calls for
//! different receipts do not interfere. Calls for the same receipt id race
//! on the same path and the last writer wins.
//!
//! Lifecycle of a job:
//! 1. read any TrueType font files, then build the canvas (failure returns
//!    immediately, nothing to clean up)
//! 2. create the output directory
//! 3. open the output file
//! 4. draw every [`Section`] in order
//! 5. encode the document on the blocking pool and wait for the file to be
//!    flushed
//!
//! Any failure in steps 3 to 5 closes the file and deletes it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};

use super::buffered::PrintPdfCanvasFactory;
use super::canvas::{Canvas, CanvasFactory, CanvasOptions};
use super::fonts::{FontChooser, FontFiles, FontSet};
use super::output::{self, OutputStream};
use super::style;
use super::template::{DefaultTemplate, ReceiptTemplate, RenderContext, Section};
use super::traits::Renderer;
use super::{GenerationError, GenerationResult};
use crate::config::AppConfig;
use crate::receipt::Receipt;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub output_dir: PathBuf,
    pub fonts: FontSet,
    pub tax_rate_percent: Option<f64>,
}

impl GeneratorConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fonts: FontSet::default(),
            tax_rate_percent: None,
        }
    }

    pub fn from_app(config: &AppConfig) -> Self {
        let fonts = match &config.primary_font_path {
            Some(path) => FontSet::with_primary_file(path.clone()),
            None => FontSet::default(),
        };
        Self {
            output_dir: config.pdf_output_dir.clone(),
            fonts,
            tax_rate_percent: config.tax_rate_percent,
        }
    }
}

/// State of one `generate` call. Dropped when the call returns.
struct GenerationJob {
    prefix: String,
    file_path: PathBuf,
    canvas: Option<Box<dyn Canvas>>,
    stream: Option<OutputStream>,
}

impl GenerationJob {
    /// Closes whatever is still open and deletes the partial file.
    async fn cleanup(&mut self) {
        self.canvas = None;
        if let Some(stream) = self.stream.take() {
            output::close_stream(stream, &self.prefix).await;
        }
        output::remove_partial(&self.file_path, &self.prefix).await;
    }
}

pub struct PdfGenerator {
    config: GeneratorConfig,
    template: Arc<dyn ReceiptTemplate>,
    canvas_factory: Arc<dyn CanvasFactory>,
}

impl PdfGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(DefaultTemplate),
            Arc::new(PrintPdfCanvasFactory),
        )
    }

    pub fn with_parts(
        config: GeneratorConfig,
        template: Arc<dyn ReceiptTemplate>,
        canvas_factory: Arc<dyn CanvasFactory>,
    ) -> Self {
        Self {
            config,
            template,
            canvas_factory,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Render `receipt` to `<output_dir>/<receipt_id>.pdf`.
    pub async fn generate(&self, receipt: &Receipt, operation_id: &str) -> GenerationResult {
        let font_files = FontFiles::load(&self.config.fonts).await;
        let mut job = match self.initialize(receipt, operation_id, font_files) {
            Ok(job) => job,
            Err(e) => {
                error!(
                    "[{}][receipt {}] {}",
                    operation_id, receipt.receipt_id, e
                );
                return GenerationResult::failed(e.to_string());
            }
        };
        info!("{} generating {}", job.prefix, job.file_path.display());

        if let Err(e) = output::ensure_output_dir(&self.config.output_dir).await {
            error!("{} {}", job.prefix, e);
            return GenerationResult::failed(e.to_string());
        }

        match self.stream_document(&mut job, receipt).await {
            Ok(()) => {
                info!("{} wrote {}", job.prefix, job.file_path.display());
                GenerationResult::succeeded(&job.file_path)
            }
            Err(e) => {
                error!("{} generation failed: {}", job.prefix, e);
                job.cleanup().await;
                GenerationResult::failed(e.to_string())
            }
        }
    }

    fn initialize(
        &self,
        receipt: &Receipt,
        operation_id: &str,
        font_files: FontFiles,
    ) -> Result<GenerationJob, GenerationError> {
        let prefix = format!("[{}][receipt {}]", operation_id, receipt.receipt_id);
        let file_path = output::target_path(&self.config.output_dir, receipt.receipt_id);
        let canvas = self
            .canvas_factory
            .create(
                style::page_geometry(),
                CanvasOptions {
                    title: format!("Receipt {}", receipt.receipt_id),
                    buffer_pages: true,
                    font_files,
                },
            )
            .map_err(GenerationError::CanvasInit)?;

        Ok(GenerationJob {
            prefix,
            file_path,
            canvas: Some(canvas),
            stream: None,
        })
    }

    async fn stream_document(&self, job: &mut GenerationJob, receipt: &Receipt) -> Result<(), GenerationError> {
        job.stream = Some(output::open_stream(&job.file_path).await?);
        self.render_sections(job, receipt)?;
        self.finalize(job).await
    }

    fn render_sections(&self, job: &mut GenerationJob, receipt: &Receipt) -> Result<(), GenerationError> {
        let canvas = job
            .canvas
            .as_deref_mut()
            .ok_or(GenerationError::AlreadyFinalized)?;
        let fonts = FontChooser::new(self.config.fonts.clone(), job.prefix.clone());
        let mut ctx = RenderContext::new(canvas, fonts, &job.prefix, self.config.tax_rate_percent);

        for section in Section::ORDER {
            debug!("{} rendering {}", job.prefix, section);
            self.template
                .render_section(section, &mut ctx, receipt)
                .map_err(|source| GenerationError::Section { section, source })?;
        }
        Ok(())
    }

    async fn finalize(&self, job: &mut GenerationJob) -> Result<(), GenerationError> {
        let canvas = job.canvas.take().ok_or(GenerationError::AlreadyFinalized)?;
        let pages = canvas.page_count();
        let bytes = tokio::task::spawn_blocking(move || canvas.finish())
            .await
            .map_err(GenerationError::FinalizeJoin)?
            .map_err(GenerationError::Finalize)?;

        let stream = job
            .stream
            .as_mut()
            .ok_or(GenerationError::AlreadyFinalized)?;
        output::finish_stream(stream, &bytes).await?;
        job.stream = None;
        debug!("{} flushed {} bytes, {} page(s)", job.prefix, bytes.len(), pages);
        Ok(())
    }
}

#[async_trait]
impl Renderer for PdfGenerator {
    fn name(&self) -> &'static str {
        "canvas"
    }

    fn output_path(&self, receipt_id: i64) -> PathBuf {
        output::target_path(&self.config.output_dir, receipt_id)
    }

    async fn render(&self, receipt: &Receipt, operation_id: &str) -> GenerationResult {
        self.generate(receipt, operation_id).await
    }
}
