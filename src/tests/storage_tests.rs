use crate::db::connection::init_db;
use crate::db::crawl_runs::{end_crawl_run, recent_crawl_runs, start_crawl_run, RunTotals};
use crate::db::listings::{count_listings, get_listings, save_listings};
use crate::db::SaveSummary;
use crate::errors::StorageError;
use crate::spreadsheets::{snapshot_filename, write_snapshot, SnapshotFormat};
use crate::tests::utils::{init_test_db, record, unique_temp_path};
use chrono::NaiveDate;

fn sample_records() -> Vec<crate::scraper::ListingRecord> {
    vec![
        record(
            "2015 Honda Civic",
            "$8,500",
            Some(8500.0),
            "https://www.kijiji.ca/v-car-12345",
        ),
        record("Lamp", "", None, "https://www.kijiji.ca/v-lamp-2"),
    ]
}

#[test]
fn save_is_insert_or_ignore_by_url() {
    let db = init_test_db("listings_save");

    let first = save_listings(&db, &sample_records()).unwrap();
    assert_eq!(
        first,
        SaveSummary {
            inserted: 2,
            ignored: 0
        }
    );

    // Same URL with a different title must not overwrite the stored row.
    let repeat = vec![
        record(
            "Honda Civic (price drop)",
            "$7,900",
            Some(7900.0),
            "https://www.kijiji.ca/v-car-12345",
        ),
        record("Desk", "$40", Some(40.0), "https://www.kijiji.ca/v-desk-3"),
    ];
    let second = save_listings(&db, &repeat).unwrap();
    assert_eq!(
        second,
        SaveSummary {
            inserted: 1,
            ignored: 1
        }
    );

    assert_eq!(count_listings(&db).unwrap(), 3);

    let stored = get_listings(&db).unwrap();
    let civic = stored
        .iter()
        .find(|r| r.url == "https://www.kijiji.ca/v-car-12345")
        .unwrap();
    assert_eq!(civic.title, "2015 Honda Civic");
    assert_eq!(civic.price, Some(8500.0));

    let lamp = stored.iter().find(|r| r.title == "Lamp").unwrap();
    assert_eq!(lamp.price, None);
    assert_eq!(lamp.price_text, "");
}

#[test]
fn init_db_can_run_twice() {
    let db = init_test_db("listings_init");
    init_db(&db).expect("second init is a no-op");
    assert_eq!(count_listings(&db).unwrap(), 0);
}

#[test]
fn crawl_runs_record_outcome() {
    let db = init_test_db("crawl_runs");

    let runs = db
        .with_conn(|conn| {
            let ok = start_crawl_run(conn, "https://www.kijiji.ca/b-ottawa/l1700185", 100)?;
            end_crawl_run(
                conn,
                ok,
                110,
                &RunTotals {
                    pages_fetched: 2,
                    listings_seen: 40,
                    listings_inserted: 35,
                    error: None,
                },
            )?;

            let failed = start_crawl_run(conn, "https://www.kijiji.ca/b-ottawa/l1700185", 200)?;
            end_crawl_run(
                conn,
                failed,
                205,
                &RunTotals {
                    pages_fetched: 1,
                    listings_seen: 20,
                    listings_inserted: 0,
                    error: Some("page 2: connection reset".into()),
                },
            )?;

            recent_crawl_runs(conn)
        })
        .unwrap();

    assert_eq!(runs.len(), 2);
    assert!(!runs[0].success);
    assert_eq!(runs[0].error_message.as_deref(), Some("page 2: connection reset"));
    assert_eq!(runs[0].pages_fetched, Some(1));
    assert!(runs[1].success);
    assert_eq!(runs[1].listings_inserted, Some(35));
    assert_eq!(runs[1].finished_at, Some(110));
}

#[test]
fn snapshot_filename_embeds_timestamp() {
    let taken_at = NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(14, 25, 1)
        .unwrap();

    assert_eq!(
        snapshot_filename("kijiji_ottawa", SnapshotFormat::Csv, taken_at),
        "kijiji_ottawa_20261018_142501.csv"
    );
    assert_eq!(
        snapshot_filename("kijiji_ottawa", SnapshotFormat::Xlsx, taken_at),
        "kijiji_ottawa_20261018_142501.xlsx"
    );
}

#[test]
fn csv_snapshot_has_header_and_blank_missing_prices() {
    let dir = unique_temp_path("snapshot_csv", "d");
    let taken_at = NaiveDate::from_ymd_opt(2026, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();

    let path = write_snapshot(&sample_records(), &dir, "test", SnapshotFormat::Csv, taken_at)
        .expect("snapshot written");
    assert!(path.ends_with("test_20260102_030405.csv"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["title", "price_text", "price", "url"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "2015 Honda Civic");
    assert_eq!(&rows[0][1], "$8,500");
    assert_eq!(rows[0][2].parse::<f64>().unwrap(), 8500.0);
    assert_eq!(&rows[0][3], "https://www.kijiji.ca/v-car-12345");
    assert_eq!(&rows[1][1], "");
    assert_eq!(&rows[1][2], "");

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn xlsx_snapshot_is_a_zip_container() {
    let dir = unique_temp_path("snapshot_xlsx", "d");
    let taken_at = NaiveDate::from_ymd_opt(2026, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();

    let path = write_snapshot(&sample_records(), &dir, "test", SnapshotFormat::Xlsx, taken_at)
        .expect("snapshot written");

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"PK"));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn snapshot_into_unusable_directory_is_an_error() {
    let blocker = unique_temp_path("snapshot_blocker", "txt");
    std::fs::write(&blocker, "not a directory").unwrap();
    let taken_at = NaiveDate::from_ymd_opt(2026, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();

    let result = write_snapshot(&sample_records(), &blocker, "test", SnapshotFormat::Csv, taken_at);
    assert!(matches!(result, Err(StorageError::Io(_))));

    let _ = std::fs::remove_file(blocker);
}
