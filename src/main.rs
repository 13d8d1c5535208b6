use crate::cli::Cli;
use crate::config::CrawlConfig;
use crate::db::crawl_runs::{end_crawl_run, recent_crawl_runs, start_crawl_run, RunTotals};
use crate::db::listings::count_listings;
use crate::db::{init_db, save_listings, Database, SaveSummary};
use crate::scraper::{
    CrawlError, CrawlOrchestrator, CrawlReport, HttpFetcher, ListingExtractor, ListingRecord,
    ScraperError,
};
use chrono::{Local, Utc};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod db;
mod errors;
mod scraper;
mod spreadsheets;

#[cfg(test)]
mod tests;

const EXIT_OK: i32 = 0;
const EXIT_CRAWL_FAILED: i32 = 1;
const EXIT_NO_LISTINGS: i32 = 2;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let cli = Cli::parse();
    let show_history = cli.history;
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(EXIT_CRAWL_FAILED);
        }
    };

    // Storage problems are logged and the crawl goes ahead without persistence.
    let db = Database::new(&config.database_path);
    let db = match init_db(&db) {
        Ok(()) => Some(db),
        Err(e) => {
            warn!(error = %e, "Database unavailable; listings will not be persisted");
            None
        }
    };

    if show_history {
        match db.as_ref() {
            Some(db) => print_history(db),
            None => std::process::exit(EXIT_CRAWL_FAILED),
        }
        return;
    }

    let run_id = db.as_ref().and_then(|db| {
        match db.with_conn(|conn| start_crawl_run(conn, &config.base_url, Utc::now().timestamp())) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "Failed to record crawl start");
                None
            }
        }
    });

    let mut crawler = match build_crawler(&config) {
        Ok(crawler) => crawler,
        Err(e) => {
            error!(error = %e, "Crawler setup failed");
            std::process::exit(EXIT_CRAWL_FAILED);
        }
    };

    let outcome = crawler.run();
    let code = settle_crawl(&config, db.as_ref(), run_id, outcome);
    if code != EXIT_OK {
        std::process::exit(code);
    }
}

/// Report, persist and snapshot whatever the crawl produced, then close the
/// run record. Returns the process exit code.
fn settle_crawl(
    config: &CrawlConfig,
    db: Option<&Database>,
    run_id: Option<i64>,
    outcome: Result<CrawlReport, CrawlError>,
) -> i32 {
    let (report, failure) = match outcome {
        Ok(report) => (report, None),
        Err(CrawlError::NoListings { pages_fetched }) => {
            println!("No listings parsed. The page structure may have changed.");
            let totals = RunTotals {
                pages_fetched,
                error: Some("no listings extracted".to_string()),
                ..RunTotals::default()
            };
            finish_run(db, run_id, &totals);
            return EXIT_NO_LISTINGS;
        }
        Err(CrawlError::Fetch {
            page,
            url,
            partial,
            source,
        }) => {
            let message = format!("page {page} ({url}): {source}");
            (partial, Some(message))
        }
    };

    print_preview(&report.records, report.pages_fetched, config.preview);

    let inserted = db
        .and_then(|db| match save_listings(db, &report.records) {
            Ok(SaveSummary { inserted, .. }) => Some(inserted),
            Err(e) => {
                error!(error = %e, "Failed to persist listings");
                None
            }
        })
        .unwrap_or(0);

    if !report.records.is_empty() {
        export_snapshot(config, &report.records);
    }

    let totals = RunTotals {
        pages_fetched: report.pages_fetched,
        listings_seen: report.records.len(),
        listings_inserted: inserted,
        error: failure.clone(),
    };
    finish_run(db, run_id, &totals);

    if let Some(message) = failure {
        eprintln!("Crawl failed: {message}");
        return EXIT_CRAWL_FAILED;
    }

    let stored = db.and_then(|db| count_listings(db).ok());
    info!(
        pages = report.pages_fetched,
        listings = report.records.len(),
        inserted,
        stored,
        "Crawl complete"
    );
    EXIT_OK
}

fn build_crawler(config: &CrawlConfig) -> Result<CrawlOrchestrator<HttpFetcher>, ScraperError> {
    let fetcher = HttpFetcher::new(&config.fetch)?;
    let extractor = ListingExtractor::new(&config.site_url()?, config.selection)?;
    Ok(CrawlOrchestrator::new(fetcher, extractor, config.plan()))
}

fn print_preview(records: &[ListingRecord], pages: usize, limit: usize) {
    println!("Found {} listings across {} page(s).", records.len(), pages);
    for (i, record) in records.iter().take(limit).enumerate() {
        println!(
            "{}. {}  |  {}  |  {}",
            i + 1,
            record.title,
            record.price_label(),
            record.url
        );
    }
}

fn export_snapshot(config: &CrawlConfig, records: &[ListingRecord]) {
    match spreadsheets::write_snapshot(
        records,
        &config.snapshot_dir,
        &config.snapshot_prefix,
        config.snapshot_format,
        Local::now().naive_local(),
    ) {
        Ok(path) => println!(
            "\nWrote {}: {}",
            config.snapshot_format.extension().to_uppercase(),
            path.display()
        ),
        Err(e) => {
            error!(error = %e, "Snapshot write failed");
            println!("\nSnapshot write failed: {e}");
        }
    }
}

fn finish_run(db: Option<&Database>, run_id: Option<i64>, totals: &RunTotals) {
    let (Some(db), Some(run_id)) = (db, run_id) else {
        return;
    };
    if let Err(e) = db.with_conn(|conn| end_crawl_run(conn, run_id, Utc::now().timestamp(), totals)) {
        warn!(error = %e, "Failed to record crawl end");
    }
}

fn print_history(db: &Database) {
    let runs = match db.with_conn(|conn| recent_crawl_runs(conn)) {
        Ok(runs) => runs,
        Err(e) => {
            error!(error = %e, "Failed to load crawl history");
            return;
        }
    };

    if runs.is_empty() {
        println!("No crawl runs recorded yet.");
        return;
    }

    for run in runs {
        let status = match (run.finished_at, run.success) {
            (None, _) => "unfinished",
            (Some(_), true) => "ok",
            (Some(_), false) => "failed",
        };
        println!(
            "#{} {} {} pages={} seen={} new={} {}{}",
            run.id,
            run.started_at,
            status,
            run.pages_fetched.unwrap_or(0),
            run.listings_seen.unwrap_or(0),
            run.listings_inserted.unwrap_or(0),
            run.base_url,
            run.error_message
                .map(|e| format!(" ({e})"))
                .unwrap_or_default()
        );
    }
}
