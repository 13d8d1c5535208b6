//! Command-line interface.
//!
//! Every flag is optional: unset flags fall back to the JSON config file (if
//! given) and then to the built-in defaults in [`crate::config`].

use crate::config::CrawlConfig;
use crate::scraper::{ScraperError, SelectionPolicy};
use crate::spreadsheets::SnapshotFormat;
use clap::Parser;

/// Crawl classified-ad result pages and store the listings found.
///
/// # Examples
///
/// ```sh
/// # First page of the default city with default settings
/// listing_scraper
///
/// # Three pages, shorter pauses, XLSX snapshot
/// listing_scraper --pages 3 --min-delay 1 --max-delay 2 --format xlsx
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a JSON config file
    #[arg(short, long, env = "LISTING_SCRAPER_CONFIG")]
    pub config: Option<String>,

    /// First result page to crawl
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Number of result pages to fetch
    #[arg(short, long)]
    pub pages: Option<u32>,

    /// Minimum pause between pages, in seconds
    #[arg(long)]
    pub min_delay: Option<f64>,

    /// Maximum pause between pages, in seconds
    #[arg(long)]
    pub max_delay: Option<f64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// SQLite database file
    #[arg(long)]
    pub db: Option<String>,

    /// Directory for the snapshot file
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Snapshot file format
    #[arg(short, long, value_enum)]
    pub format: Option<SnapshotFormat>,

    /// How listing-anchor patterns are combined
    #[arg(long, value_enum)]
    pub selection: Option<SelectionPolicy>,

    /// Listings echoed to stdout after the crawl
    #[arg(long)]
    pub preview: Option<usize>,

    /// Print recent crawl runs from the database and exit
    #[arg(long)]
    pub history: bool,
}

impl Cli {
    /// Resolve the effective configuration: defaults, then file, then flags.
    pub fn into_config(self) -> Result<CrawlConfig, ScraperError> {
        let mut config = match &self.config {
            Some(path) => CrawlConfig::from_file(path)?,
            None => CrawlConfig::default(),
        };

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(pages) = self.pages {
            config.pages = pages;
        }
        if let Some(min) = self.min_delay {
            config.min_delay_secs = min;
        }
        if let Some(max) = self.max_delay {
            config.max_delay_secs = max;
        }
        if let Some(user_agent) = self.user_agent {
            config.fetch.user_agent = user_agent;
        }
        if let Some(db) = self.db {
            config.database_path = db;
        }
        if let Some(out_dir) = self.out_dir {
            config.snapshot_dir = out_dir;
        }
        if let Some(format) = self.format {
            config.snapshot_format = format;
        }
        if let Some(selection) = self.selection {
            config.selection = selection;
        }
        if let Some(preview) = self.preview {
            config.preview = preview;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["listing_scraper"]);
        let config = cli.into_config().unwrap();

        assert_eq!(config.base_url, crate::config::DEFAULT_BASE_URL);
        assert_eq!(config.pages, 1);
        assert_eq!(config.snapshot_format, SnapshotFormat::Csv);
        assert_eq!(config.selection, SelectionPolicy::FirstMatch);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "listing_scraper",
            "--pages",
            "3",
            "--min-delay",
            "0.5",
            "--max-delay",
            "1.5",
            "--format",
            "xlsx",
            "--selection",
            "union-excluding",
            "-o",
            "/tmp/snapshots",
        ]);
        let config = cli.into_config().unwrap();

        assert_eq!(config.pages, 3);
        assert_eq!(config.min_delay_secs, 0.5);
        assert_eq!(config.max_delay_secs, 1.5);
        assert_eq!(config.snapshot_format, SnapshotFormat::Xlsx);
        assert_eq!(config.selection, SelectionPolicy::UnionExcluding);
        assert_eq!(config.snapshot_dir, "/tmp/snapshots");
    }

    #[test]
    fn test_cli_rejects_inverted_delay() {
        let cli = Cli::parse_from(["listing_scraper", "--min-delay", "5", "--max-delay", "1"]);
        assert!(matches!(cli.into_config(), Err(ScraperError::Config(_))));
    }
}
