mod fetcher_tests;
mod storage_tests;
mod utils;
