use crate::db::connection::{init_db, Database};
use crate::scraper::{ListingExtractor, ListingRecord, SelectionPolicy};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

pub const SITE: &str = "https://www.kijiji.ca/b-ottawa/l1700185";

/// A path under the system temp dir that no other test will pick.
pub fn unique_temp_path(stem: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "{stem}_{}_{:?}.{ext}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        std::thread::current().id()
    )
    .replace(['(', ')'], ""))
}

/// Initialize a fresh test DB using the production schema
pub fn init_test_db(stem: &str) -> Database {
    let db = Database::new(unique_temp_path(stem, "sqlite"));
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub fn extractor(policy: SelectionPolicy) -> ListingExtractor {
    ListingExtractor::new(&Url::parse(SITE).unwrap(), policy).expect("extractor builds")
}

pub fn record(title: &str, price_text: &str, price: Option<f64>, url: &str) -> ListingRecord {
    ListingRecord {
        title: title.to_string(),
        price_text: price_text.to_string(),
        price,
        url: url.to_string(),
    }
}

/// Wrap card markup in a minimal results page.
pub fn page(cards: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>Results</title></head><body><main>{cards}</main></body></html>")
}
