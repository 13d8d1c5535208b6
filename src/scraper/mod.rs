pub mod crawler;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod price;
mod scraper_error;

pub use crawler::{CrawlError, CrawlOrchestrator, CrawlReport};
pub use extractor::{ListingExtractor, SelectionPolicy};
pub use fetcher::HttpFetcher;
pub use models::ListingRecord;
pub use scraper_error::ScraperError;
