//! Crawl configuration.
//!
//! Defaults reproduce the Kijiji Ottawa setup. A JSON file can override any
//! subset of fields, and command-line flags override the file (see [`crate::cli`]).

use crate::scraper::{ScraperError, SelectionPolicy};
use crate::spreadsheets::SnapshotFormat;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.kijiji.ca/b-ottawa/l1700185";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_4) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-CA,en;q=0.9";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub base_url: String,
    pub pages: u32,
    pub page_param: String,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub selection: SelectionPolicy,
    pub fetch: FetchConfig,

    pub database_path: String,
    pub snapshot_dir: String,
    pub snapshot_prefix: String,
    pub snapshot_format: SnapshotFormat,
    /// Listings echoed to stdout after the crawl.
    pub preview: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pages: 1,
            page_param: "page".to_string(),
            min_delay_secs: 2.0,
            max_delay_secs: 5.0,
            selection: SelectionPolicy::default(),
            fetch: FetchConfig::default(),
            database_path: "listings.sqlite3".to_string(),
            snapshot_dir: ".".to_string(),
            snapshot_prefix: "kijiji_ottawa".to_string(),
            snapshot_format: SnapshotFormat::default(),
            preview: 20,
        }
    }
}

impl CrawlConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| ScraperError::Config(format!("Invalid config {}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<(), ScraperError> {
        self.site_url()?;

        if self.pages == 0 {
            return Err(ScraperError::Config("pages must be at least 1".into()));
        }
        if self.page_param.trim().is_empty() {
            return Err(ScraperError::Config("page_param must not be empty".into()));
        }

        let (min, max) = (self.min_delay_secs, self.max_delay_secs);
        if Duration::try_from_secs_f64(min).is_err() || Duration::try_from_secs_f64(max).is_err() {
            return Err(ScraperError::Config(format!(
                "delay bounds must be representable non-negative seconds, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(ScraperError::Config(format!(
                "min delay {min}s exceeds max delay {max}s"
            )));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ScraperError::Config("timeout_secs must be at least 1".into()));
        }

        Ok(())
    }

    pub fn site_url(&self) -> Result<Url, ScraperError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ScraperError::Config(format!("Invalid base URL {}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ScraperError::Config(format!(
                "base URL must be http(s) with a host: {}",
                self.base_url
            )));
        }
        Ok(url)
    }

    pub fn plan(&self) -> CrawlPlan {
        CrawlPlan {
            base_url: self.base_url.clone(),
            pages: self.pages,
            page_param: self.page_param.clone(),
            delay: DelayWindow::from_secs(self.min_delay_secs, self.max_delay_secs),
        }
    }
}

/// What the orchestrator needs to walk the result pages.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub base_url: String,
    pub pages: u32,
    pub page_param: String,
    pub delay: DelayWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    pub min: Duration,
    pub max: Duration,
}

impl DelayWindow {
    /// Invalid bounds collapse to zero; `CrawlConfig::validate` rejects them first.
    pub fn from_secs(min: f64, max: f64) -> Self {
        let min = Duration::try_from_secs_f64(min).unwrap_or(Duration::ZERO);
        let max = Duration::try_from_secs_f64(max).unwrap_or(Duration::ZERO);
        Self { min, max: max.max(min) }
    }

    /// Uniform draw from `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}
