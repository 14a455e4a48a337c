//! HTML renderer driven through a WebDriver-controlled headless browser.
//!
//! The browser side sits behind three small traits so the renderer's
//! cleanup guarantees can be exercised without a real driver:
//! [`BrowserLauncher`] starts a [`Browser`], which opens [`BrowserPage`]s.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use fantoccini::wd::{PrintConfigurationBuilder, PrintSize};
use fantoccini::{Client, ClientBuilder, Locator};
use log::{debug, error, info, warn};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::process::{Child, Command};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::traits::Renderer;
use super::{html, output, GenerationError, GenerationResult};
use crate::receipt::Receipt;

const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_BACKOFF: Duration = Duration::from_millis(250);
const BODY_WAIT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> anyhow::Result<Box<dyn Browser>>;
}

#[async_trait]
pub trait Browser: Send {
    async fn new_page(&mut self) -> anyhow::Result<Box<dyn BrowserPage>>;
    async fn close(&mut self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait BrowserPage: Send {
    /// Load `html` and wait until its body is available.
    async fn set_content(&mut self, html: &str) -> anyhow::Result<()>;
    /// Print the loaded document as an A4 PDF with backgrounds.
    async fn print_pdf(&mut self) -> anyhow::Result<Vec<u8>>;
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Spawns a WebDriver binary (chromedriver by default) and connects a
/// headless session to it. Each launch owns its driver process.
///
/// Without a pinned port every driver listens on a port freshly reserved
/// from the OS. With one, drivers share that port, so a launch waits until
/// the previous browser has closed.
pub struct WebDriverLauncher {
    driver_path: String,
    pinned_port: Option<u16>,
    pinned: Arc<Semaphore>,
}

impl WebDriverLauncher {
    pub fn new(driver_path: String, pinned_port: Option<u16>) -> Self {
        Self {
            driver_path,
            pinned_port,
            pinned: Arc::new(Semaphore::new(1)),
        }
    }

    fn capabilities() -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": ["--headless=new", "--disable-gpu", "--no-sandbox"]
            }),
        );
        caps
    }

    async fn reserve_port(&self) -> anyhow::Result<(u16, Option<OwnedSemaphorePermit>)> {
        match self.pinned_port {
            Some(port) => {
                let permit = self
                    .pinned
                    .clone()
                    .acquire_owned()
                    .await
                    .context("waiting for pinned webdriver port")?;
                Ok((port, Some(permit)))
            }
            None => Ok((free_port().await?, None)),
        }
    }

    async fn connect(port: u16) -> anyhow::Result<Client> {
        let url = format!("http://127.0.0.1:{}", port);
        let mut last_error = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            match ClientBuilder::native()
                .capabilities(Self::capabilities())
                .connect(&url)
                .await
            {
                Ok(client) => return Ok(client),
                Err(e) => {
                    debug!("webdriver not ready (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                    tokio::time::sleep(CONNECT_BACKOFF).await;
                }
            }
        }
        match last_error {
            Some(e) => Err(anyhow!("connecting to webdriver at {}: {}", url, e)),
            None => Err(anyhow!("connecting to webdriver at {}", url)),
        }
    }
}

/// Asks the OS for an unused local port. The listener is dropped before
/// returning so the driver can bind the port.
pub async fn free_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .context("reserving a local port")?;
    let port = listener.local_addr().context("reading reserved port")?.port();
    Ok(port)
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> anyhow::Result<Box<dyn Browser>> {
        let (port, permit) = self.reserve_port().await?;
        debug!("starting {} on port {}", self.driver_path, port);
        let mut driver = Command::new(&self.driver_path)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("starting webdriver '{}'", self.driver_path))?;

        match Self::connect(port).await {
            Ok(client) => Ok(Box::new(WebDriverBrowser {
                driver,
                client: Some(client),
                permit,
            })),
            Err(e) => {
                if let Err(kill_err) = driver.kill().await {
                    warn!("failed to stop webdriver after connect error: {}", kill_err);
                }
                Err(e)
            }
        }
    }
}

struct WebDriverBrowser {
    driver: Child,
    client: Option<Client>,
    /// Held until the driver is gone when the port is pinned.
    permit: Option<OwnedSemaphorePermit>,
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn new_page(&mut self) -> anyhow::Result<Box<dyn BrowserPage>> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| anyhow!("browser session already closed"))?;
        Ok(Box::new(WebDriverPage { client, dir: None }))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        let session = match self.client.take() {
            Some(client) => client
                .close()
                .await
                .map_err(|e| anyhow!("closing webdriver session: {}", e)),
            None => Ok(()),
        };
        let process = self.driver.kill().await.context("stopping webdriver");
        self.permit = None;
        session.and(process)
    }
}

struct WebDriverPage {
    client: Client,
    dir: Option<TempDir>,
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    async fn set_content(&mut self, html: &str) -> anyhow::Result<()> {
        let dir = tempfile::Builder::new()
            .prefix("receipt-html-")
            .tempdir()
            .context("creating temporary directory")?;
        let path = dir.path().join("receipt.html");
        tokio::fs::write(&path, html)
            .await
            .context("writing receipt HTML")?;
        let dir = self.dir.insert(dir);
        debug!("loading {}", dir.path().display());

        self.client
            .goto(&format!("file://{}", path.display()))
            .await
            .map_err(|e| anyhow!("navigating to receipt HTML: {}", e))?;
        self.client
            .wait()
            .at_most(BODY_WAIT)
            .for_element(Locator::Css("body"))
            .await
            .map_err(|e| anyhow!("waiting for document body: {}", e))?;
        Ok(())
    }

    async fn print_pdf(&mut self) -> anyhow::Result<Vec<u8>> {
        let config = PrintConfigurationBuilder::default()
            .size(PrintSize::A4)
            .background(true)
            .build()
            .map_err(|e| anyhow!("invalid print configuration: {:?}", e))?;
        self.client
            .print(config)
            .await
            .map_err(|e| anyhow!("printing page: {}", e))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        let blank = self
            .client
            .goto("about:blank")
            .await
            .map_err(|e| anyhow!("unloading receipt page: {}", e));
        let removed = match self.dir.take() {
            Some(dir) => dir.close().context("removing temporary HTML"),
            None => Ok(()),
        };
        blank.and(removed)
    }
}

/// Renders receipts as HTML and prints them through a [`BrowserLauncher`].
pub struct BrowserRenderer {
    output_dir: PathBuf,
    tax_rate_percent: Option<f64>,
    launcher: Arc<dyn BrowserLauncher>,
}

impl BrowserRenderer {
    pub fn new(
        output_dir: PathBuf,
        tax_rate_percent: Option<f64>,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            output_dir,
            tax_rate_percent,
            launcher,
        }
    }

    async fn rasterize(&self, html: &str, prefix: &str) -> Result<Vec<u8>, GenerationError> {
        let mut browser = self
            .launcher
            .launch()
            .await
            .map_err(|e| GenerationError::BrowserLaunch(format!("{:#}", e)))?;

        let mut page = None;
        let result = print_document(browser.as_mut(), &mut page, html).await;

        if let Some(mut page) = page {
            if let Err(e) = page.close().await {
                warn!("{} failed to close page: {:#}", prefix, e);
            }
        }
        if let Err(e) = browser.close().await {
            warn!("{} failed to close browser: {:#}", prefix, e);
        }
        result
    }
}

async fn print_document(
    browser: &mut dyn Browser,
    page: &mut Option<Box<dyn BrowserPage>>,
    html: &str,
) -> Result<Vec<u8>, GenerationError> {
    let page = page.insert(
        browser
            .new_page()
            .await
            .map_err(|e| GenerationError::BrowserLaunch(format!("{:#}", e)))?,
    );
    page.set_content(html)
        .await
        .map_err(|e| GenerationError::ContentInjection(format!("{:#}", e)))?;
    let bytes = page
        .print_pdf()
        .await
        .map_err(|e| GenerationError::Rasterize(format!("{:#}", e)))?;
    if bytes.is_empty() {
        return Err(GenerationError::Rasterize("browser returned an empty document".to_string()));
    }
    Ok(bytes)
}

#[async_trait]
impl Renderer for BrowserRenderer {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn output_path(&self, receipt_id: i64) -> PathBuf {
        output::target_path(&self.output_dir, receipt_id)
    }

    async fn render(&self, receipt: &Receipt, operation_id: &str) -> GenerationResult {
        let prefix = format!("[{}][receipt {}]", operation_id, receipt.receipt_id);
        let file_path = self.output_path(receipt.receipt_id);
        info!("{} generating {} via browser", prefix, file_path.display());

        let document = match html::render_document(receipt, self.tax_rate_percent) {
            Ok(document) => document,
            Err(e) => {
                let e = GenerationError::Template(e);
                error!("{} {}", prefix, e);
                return GenerationResult::failed(e.to_string());
            }
        };
        let bytes = match self.rasterize(&document, &prefix).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("{} {}", prefix, e);
                return GenerationResult::failed(e.to_string());
            }
        };

        if let Err(e) = output::ensure_output_dir(&self.output_dir).await {
            error!("{} {}", prefix, e);
            return GenerationResult::failed(e.to_string());
        }
        match output::write_document(&file_path, &bytes, &prefix).await {
            Ok(()) => {
                info!("{} wrote {}", prefix, file_path.display());
                GenerationResult::succeeded(&file_path)
            }
            Err(e) => {
                error!("{} {}", prefix, e);
                GenerationResult::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_free_port_is_released_for_the_driver() {
        let port = free_port().await.unwrap();
        assert_ne!(port, 0);
        // The driver must be able to bind it right away.
        let listener = std::net::TcpListener::bind(("127.0.0.1", port)).unwrap();
        assert_eq!(listener.local_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_pinned_port_is_held_until_released() {
        let launcher = WebDriverLauncher::new("chromedriver".to_string(), Some(9515));
        let (port, permit) = launcher.reserve_port().await.unwrap();
        assert_eq!(port, 9515);
        assert!(permit.is_some());

        let waiting = tokio::time::timeout(Duration::from_millis(50), launcher.reserve_port()).await;
        assert!(waiting.is_err());

        drop(permit);
        let (port, permit) = launcher.reserve_port().await.unwrap();
        assert_eq!(port, 9515);
        assert!(permit.is_some());
    }

    #[tokio::test]
    async fn test_unpinned_launches_do_not_wait_on_each_other() {
        let launcher = WebDriverLauncher::new("chromedriver".to_string(), None);
        let (first, first_permit) = launcher.reserve_port().await.unwrap();
        let (second, second_permit) = launcher.reserve_port().await.unwrap();
        assert!(first_permit.is_none() && second_permit.is_none());
        assert_ne!(first, 0);
        assert_ne!(second, 0);
    }
}
