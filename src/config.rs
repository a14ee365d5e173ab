//! Configuration for download sessions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Site root used for relative links and the Referer/Origin headers.
pub const DEFAULT_BASE_URL: &str = "https://fanqienovel.com";

/// Desktop Chrome user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Download session configuration.
///
/// Missing fields in a JSON file take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Site root for relative chapter links.
    pub base_url: String,

    /// User agent sent on every request.
    pub user_agent: String,

    /// Raw `Cookie` header value.
    pub cookie: Option<String>,

    /// Page fetch timeout in milliseconds.
    pub page_timeout_ms: u64,

    /// Font fetch timeout in milliseconds.
    pub font_timeout_ms: u64,

    /// Lower bound of the pause between chapter fetches, in milliseconds.
    pub delay_min_ms: u64,

    /// Upper bound of the pause between chapter fetches, in milliseconds.
    pub delay_max_ms: u64,

    /// Where the debug log and failure pages go; `None` disables them.
    pub diagnostics_dir: Option<PathBuf>,

    /// Where the assembled document is written.
    pub output_dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            page_timeout_ms: 15_000,
            font_timeout_ms: 10_000,
            delay_min_ms: 500,
            delay_max_ms: 1_500,
            diagnostics_dir: None,
            output_dir: PathBuf::from("."),
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, [`Error::Json`] if it is
    /// not valid JSON, and [`Error::Config`] if the values fail validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check that the values can drive a session.
    pub fn validate(&self) -> Result<()> {
        if self.delay_min_ms > self.delay_max_ms {
            return Err(Error::Config(format!(
                "delay_min_ms ({}) is greater than delay_max_ms ({})",
                self.delay_min_ms, self.delay_max_ms
            )));
        }
        if self.page_timeout_ms == 0 || self.font_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!("base_url '{}' is not an http(s) URL", self.base_url)));
        }
        Ok(())
    }

    /// Set the site root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Send a cookie with every request.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Set the pause range between chapter fetches.
    pub fn with_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.delay_min_ms = min_ms;
        self.delay_max_ms = max_ms;
        self
    }

    /// Set the page fetch timeout.
    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the font fetch timeout.
    pub fn with_font_timeout(mut self, timeout: Duration) -> Self {
        self.font_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Write diagnostics into `dir`.
    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = Some(dir.into());
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Page fetch timeout.
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    /// Font fetch timeout.
    pub fn font_timeout(&self) -> Duration {
        Duration::from_millis(self.font_timeout_ms)
    }
}
