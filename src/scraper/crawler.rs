// crawler.rs
use crate::config::CrawlPlan;
use crate::scraper::extractor::{ListingExtractor, UrlSet};
use crate::scraper::fetcher::PageFetcher;
use crate::scraper::models::ListingRecord;
use crate::scraper::ScraperError;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Politeness pause between page fetches.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Unique listings across all fetched pages, in page order.
    pub records: Vec<ListingRecord>,
    pub pages_fetched: usize,
    /// New (not previously seen) listings contributed by each fetched page.
    pub per_page: Vec<usize>,
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("page {page} ({url}) failed with {} listing(s) collected: {source}", .partial.records.len())]
    Fetch {
        page: u32,
        url: String,
        partial: CrawlReport,
        #[source]
        source: ScraperError,
    },
    #[error("no listings extracted from {pages_fetched} page(s); the page structure may have changed")]
    NoListings { pages_fetched: usize },
}

/// Append the page-number parameter, respecting an existing query string.
pub fn page_url(base_url: &str, page_param: &str, page: u32) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{page_param}={page}")
}

pub struct CrawlOrchestrator<F: PageFetcher, S: Sleeper = ThreadSleeper> {
    fetcher: F,
    extractor: ListingExtractor,
    plan: CrawlPlan,
    sleeper: S,
}

impl<F: PageFetcher> CrawlOrchestrator<F, ThreadSleeper> {
    pub fn new(fetcher: F, extractor: ListingExtractor, plan: CrawlPlan) -> Self {
        Self::with_sleeper(fetcher, extractor, plan, ThreadSleeper)
    }
}

impl<F: PageFetcher, S: Sleeper> CrawlOrchestrator<F, S> {
    pub fn with_sleeper(fetcher: F, extractor: ListingExtractor, plan: CrawlPlan, sleeper: S) -> Self {
        Self {
            fetcher,
            extractor,
            plan,
            sleeper,
        }
    }

    /// Fetch pages 1..=N one at a time and collect their listings.
    ///
    /// A failed fetch stops the crawl; the listings gathered so far travel
    /// with the error. An empty result is reported as `NoListings`.
    #[instrument(level = "info", skip(self), fields(base_url = %self.plan.base_url, pages = self.plan.pages))]
    pub fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        let mut rng = rand::thread_rng();
        let mut report = CrawlReport::default();
        let mut seen = UrlSet::default();

        for page in 1..=self.plan.pages {
            if page > 1 {
                let pause = self.plan.delay.sample(&mut rng);
                debug!(?pause, "Sleeping before next page");
                self.sleeper.sleep(pause);
            }

            let url = page_url(&self.plan.base_url, &self.plan.page_param, page);
            info!(page, %url, "Fetching listing page");

            let html = match self.fetcher.fetch(&url) {
                Ok(html) => html,
                Err(source) => {
                    error!(page, %url, error = %source, "Page fetch failed; halting crawl");
                    return Err(CrawlError::Fetch {
                        page,
                        url,
                        partial: report,
                        source,
                    });
                }
            };

            let listings = self.extractor.extract(&html);
            let found = listings.len();
            let before = report.records.len();
            report
                .records
                .extend(listings.into_iter().filter(|r| seen.admit(r)));
            let added = report.records.len() - before;

            report.pages_fetched += 1;
            report.per_page.push(added);
            info!(page, found, added, total = report.records.len(), "Page parsed");
        }

        if report.records.is_empty() {
            return Err(CrawlError::NoListings {
                pages_fetched: report.pages_fetched,
            });
        }

        Ok(report)
    }
}
