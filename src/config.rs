//! Process configuration read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};

const DEFAULT_OUTPUT_DIR: &str = "./receipts";
const DEFAULT_WEBDRIVER_PATH: &str = "chromedriver";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererKind {
    #[default]
    Canvas,
    Browser,
}

impl FromStr for RendererKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canvas" | "pdf" => Ok(Self::Canvas),
            "browser" | "html" => Ok(Self::Browser),
            other => Err(anyhow!(
                "unknown renderer '{}', expected 'canvas' or 'browser'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pdf_output_dir: PathBuf,
    pub renderer: RendererKind,
    pub primary_font_path: Option<PathBuf>,
    pub tax_rate_percent: Option<f64>,
    pub webdriver_path: String,
    /// Fixed driver port. Unset means a free port per browser launch.
    pub webdriver_port: Option<u16>,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pdf_output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            renderer: RendererKind::Canvas,
            primary_font_path: None,
            tax_rate_percent: None,
            webdriver_path: DEFAULT_WEBDRIVER_PATH.to_string(),
            webdriver_port: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        match get("PDF_OUTPUT_DIR") {
            Some(dir) => config.pdf_output_dir = PathBuf::from(dir),
            None => log::info!(
                "PDF_OUTPUT_DIR not set, using default: {}",
                DEFAULT_OUTPUT_DIR
            ),
        }
        if let Some(kind) = get("RENDERER") {
            config.renderer = kind.parse().context("invalid RENDERER")?;
        }
        config.primary_font_path = get("PRIMARY_FONT_PATH").map(PathBuf::from);
        if let Some(rate) = get("TAX_RATE_PERCENT") {
            let rate: f64 = rate
                .trim()
                .parse()
                .with_context(|| format!("invalid TAX_RATE_PERCENT '{}'", rate))?;
            if !rate.is_finite() || rate < 0.0 {
                return Err(anyhow!("TAX_RATE_PERCENT must be a non-negative number"));
            }
            config.tax_rate_percent = Some(rate);
        }
        if let Some(path) = get("WEBDRIVER_PATH") {
            config.webdriver_path = path;
        }
        if let Some(port) = get("WEBDRIVER_PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("invalid WEBDRIVER_PORT '{}'", port))?;
            if port == 0 {
                return Err(anyhow!("WEBDRIVER_PORT must be a non-zero port"));
            }
            config.webdriver_port = Some(port);
        }
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.pdf_output_dir, PathBuf::from("./receipts"));
        assert_eq!(config.renderer, RendererKind::Canvas);
        assert!(config.webdriver_port.is_none());
        assert!(config.tax_rate_percent.is_none());
        assert!(config.primary_font_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PDF_OUTPUT_DIR", "/tmp/out"),
            ("RENDERER", "Browser"),
            ("TAX_RATE_PERCENT", "15"),
            ("WEBDRIVER_PORT", "9515"),
            ("PRIMARY_FONT_PATH", ""),
        ]))
        .unwrap();
        assert_eq!(config.pdf_output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.renderer, RendererKind::Browser);
        assert_eq!(config.tax_rate_percent, Some(15.0));
        assert_eq!(config.webdriver_port, Some(9515));
        assert!(config.primary_font_path.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("RENDERER", "latex")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("TAX_RATE_PERCENT", "-1")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("WEBDRIVER_PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("WEBDRIVER_PORT", "0")])).is_err());
    }
}
