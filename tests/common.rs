#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use bakery_receipts::pdf::buffered::BufferedCanvas;
use bakery_receipts::pdf::canvas::{
    Canvas, CanvasError, CanvasFactory, CanvasOptions, FontFace, PageGeometry, Rgb, TextOptions,
};
use bakery_receipts::receipt::{CustomerSnapshot, CustomerType, LineItem, Receipt, SellerSnapshot};
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<&'static CapturingLogger> = OnceLock::new();

fn logger() -> &'static CapturingLogger {
    LOGGER.get_or_init(|| {
        let logger: &'static CapturingLogger = Box::leak(Box::new(CapturingLogger {
            records: Mutex::new(Vec::new()),
        }));
        // Another test binary helper may have installed it already.
        if log::set_logger(logger).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
        logger
    })
}

/// Installs the capturing logger. Safe to call from every test.
pub fn init_logging() {
    logger();
}

/// Log lines at `level` that mention `needle` (usually an operation id).
pub fn logs_containing(level: Level, needle: &str) -> Vec<String> {
    logger()
        .records
        .lock()
        .iter()
        .filter(|(l, msg)| *l == level && msg.contains(needle))
        .map(|(_, msg)| msg.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Receipt fixtures
// ---------------------------------------------------------------------------

pub fn seller() -> SellerSnapshot {
    SellerSnapshot {
        name: Some("Golden Crust Bakery".to_string()),
        address: Some("12 Flour Lane, Brunswick VIC 3056".to_string()),
        abn: Some("51 824 753 556".to_string()),
        email: Some("hello@goldencrust.example".to_string()),
        phone: Some("03 9000 1234".to_string()),
    }
}

pub fn individual_customer() -> CustomerSnapshot {
    CustomerSnapshot {
        customer_type: CustomerType::Individual,
        first_name: Some("Mia".to_string()),
        last_name: Some("Tanaka".to_string()),
        email: Some("mia@example.com".to_string()),
        ..Default::default()
    }
}

pub fn item(name: &str, quantity: u32, unit_price: f64, taxed: bool) -> LineItem {
    LineItem {
        product_name: Some(name.to_string()),
        description: None,
        quantity,
        unit_price,
        line_total: unit_price * quantity as f64,
        tax_applicable: taxed,
    }
}

/// One taxed line: $10.00 + $1.00 GST.
pub fn tax_receipt(receipt_id: i64) -> Receipt {
    Receipt {
        receipt_id,
        customer_id: 7,
        date_purchased: "2026-10-19T09:30:00Z".to_string(),
        line_items: vec![item("Sourdough Loaf", 1, 10.0, true)],
        subtotal_excl_tax: 10.0,
        tax_amount: 1.0,
        total_incl_tax: 11.0,
        is_tax_invoice: true,
        seller: seller(),
        customer: individual_customer(),
    }
}

pub fn plain_receipt(receipt_id: i64) -> Receipt {
    Receipt {
        receipt_id,
        customer_id: 8,
        date_purchased: "2026-10-18".to_string(),
        line_items: vec![item("Croissant", 4, 3.5, false), item("Baguette", 2, 4.0, false)],
        subtotal_excl_tax: 22.0,
        tax_amount: 0.0,
        total_incl_tax: 22.0,
        is_tax_invoice: false,
        seller: seller(),
        customer: individual_customer(),
    }
}

/// `count` items whose descriptions are `description_len` characters long.
pub fn long_receipt(receipt_id: i64, count: usize, description_len: usize) -> Receipt {
    let description: String = "Stone-milled rye, slow proofed overnight. "
        .chars()
        .cycle()
        .take(description_len)
        .collect();
    let line_items: Vec<LineItem> = (0..count)
        .map(|i| LineItem {
            description: Some(description.clone()),
            ..item(&format!("Specialty Loaf #{}", i + 1), 1, 9.0, false)
        })
        .collect();
    let subtotal = 9.0 * count as f64;
    Receipt {
        receipt_id,
        customer_id: 9,
        date_purchased: "2026-10-17".to_string(),
        line_items,
        subtotal_excl_tax: subtotal,
        tax_amount: 0.0,
        total_incl_tax: subtotal,
        is_tax_invoice: false,
        seller: seller(),
        customer: individual_customer(),
    }
}

// ---------------------------------------------------------------------------
// Recording canvas with failure injection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TextCall {
    pub page: usize,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub height: f32,
}

#[derive(Debug, Default)]
pub struct Recording {
    pub texts: Vec<TextCall>,
    pub font_attempts: Vec<String>,
    pub page_count: usize,
    pub finished: bool,
}

impl Recording {
    pub fn texts_on(&self, page: usize) -> Vec<&TextCall> {
        self.texts.iter().filter(|t| t.page == page).collect()
    }

    pub fn count(&self, page: usize, text: &str) -> usize {
        self.texts
            .iter()
            .filter(|t| t.page == page && t.text == text)
            .count()
    }

    pub fn find(&self, text: &str) -> Option<&TextCall> {
        self.texts.iter().find(|t| t.text == text)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.text.contains(needle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub create: bool,
    pub fonts: Vec<String>,
    pub text_containing: Option<String>,
    pub finish: bool,
    pub finish_panics: bool,
}

struct RecordingCanvas {
    inner: BufferedCanvas,
    failures: Failures,
    recording: Arc<Mutex<Recording>>,
}

impl Canvas for RecordingCanvas {
    fn geometry(&self) -> &PageGeometry {
        self.inner.geometry()
    }

    fn select_font(&mut self, face: &FontFace, size: f32) -> Result<(), CanvasError> {
        self.recording.lock().font_attempts.push(face.name().to_string());
        if self.failures.fonts.iter().any(|f| f == face.name()) {
            return Err(CanvasError::FontUnavailable {
                font: face.name().to_string(),
                reason: "injected".to_string(),
            });
        }
        self.inner.select_font(face, size)
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.inner.set_fill_color(color)
    }

    fn text(&mut self, text: &str, x: f32, y: f32, options: TextOptions) -> Result<f32, CanvasError> {
        if let Some(needle) = &self.failures.text_containing {
            if text.contains(needle.as_str()) {
                return Err(CanvasError::Encode(format!("injected failure drawing '{}'", text)));
            }
        }
        let height = self.inner.text(text, x, y, options)?;
        self.recording.lock().texts.push(TextCall {
            page: self.inner.current_page(),
            text: text.to_string(),
            x,
            y,
            height,
        });
        Ok(height)
    }

    fn height_of(&self, text: &str, width: f32) -> f32 {
        self.inner.height_of(text, width)
    }

    fn wrap(&self, text: &str, width: f32) -> Vec<String> {
        self.inner.wrap(text, width)
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgb) -> Result<(), CanvasError> {
        self.inner.line(from, to, thickness, color)
    }

    fn add_page(&mut self) -> Result<(), CanvasError> {
        self.inner.add_page()
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn current_page(&self) -> usize {
        self.inner.current_page()
    }

    fn switch_to_page(&mut self, index: usize) -> Result<(), CanvasError> {
        self.inner.switch_to_page(index)
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, CanvasError> {
        let this = *self;
        {
            let mut recording = this.recording.lock();
            recording.page_count = this.inner.page_count();
            recording.finished = true;
        }
        if this.failures.finish {
            return Err(CanvasError::Encode("injected finish failure".to_string()));
        }
        if this.failures.finish_panics {
            panic!("encoder crashed");
        }
        Box::new(this.inner).finish()
    }
}

/// Factory handing out recording canvases that share one [`Recording`].
pub struct RecordingFactory {
    pub failures: Failures,
    pub recording: Arc<Mutex<Recording>>,
}

impl RecordingFactory {
    pub fn new(failures: Failures) -> Arc<Self> {
        Arc::new(Self {
            failures,
            recording: Arc::new(Mutex::new(Recording::default())),
        })
    }

    pub fn healthy() -> Arc<Self> {
        Self::new(Failures::default())
    }
}

impl CanvasFactory for RecordingFactory {
    fn create(&self, geometry: PageGeometry, options: CanvasOptions) -> Result<Box<dyn Canvas>, CanvasError> {
        if self.failures.create {
            return Err(CanvasError::InvalidPage("injected init failure".to_string()));
        }
        Ok(Box::new(RecordingCanvas {
            inner: BufferedCanvas::new(geometry, options)?,
            failures: self.failures.clone(),
            recording: self.recording.clone(),
        }))
    }
}

/// Page count of a PDF on disk, read back with lopdf.
pub fn pdf_page_count(path: &std::path::Path) -> usize {
    let doc = lopdf::Document::load(path).expect("generated file should be a readable PDF");
    doc.get_pages().len()
}
