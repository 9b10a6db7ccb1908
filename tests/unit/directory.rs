//! Company directory loading and resolution

use fin_metrics::directory::{CompanyDirectory, DirectoryError};
use pretty_assertions::assert_eq;
use std::io::Write;
use test_log::test;

use crate::common::fixtures;

#[test]
fn test_load_listing_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(fixtures::listing_csv().as_bytes()).unwrap();

    let directory = CompanyDirectory::from_csv_path(file.path()).unwrap();
    assert_eq!(directory.len(), 4);
    assert_eq!(directory.resolve("聯電").unwrap().code, "2303.TW");
    assert_eq!(directory.resolve("2330").unwrap().name, "台積電");
    assert_eq!(directory.resolve("Apple").unwrap().code, "AAPL");
}

#[test]
fn test_missing_listing_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = CompanyDirectory::from_csv_path(dir.path().join("missing.csv"));
    assert!(matches!(result, Err(DirectoryError::Open { .. })));
}

#[test]
fn test_search_ranks_best_first() {
    let directory = CompanyDirectory::from_csv_reader(fixtures::listing_csv().as_bytes()).unwrap();
    let results = directory.search("aple", 3);

    assert!(!results.is_empty());
    assert_eq!(results[0].0.code, "AAPL");
    assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
    assert!(directory.search("  ", 3).is_empty());
}
