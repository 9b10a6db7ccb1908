//! Financial cache integration tests

use fin_metrics::database::FinancialCache;
use pretty_assertions::assert_eq;

use crate::common::{fixtures, logging};

async fn open_cache(dir: &tempfile::TempDir) -> FinancialCache {
    FinancialCache::new(dir.path().join("financial_cache.db"))
        .await
        .expect("Failed to create test cache")
}

#[tokio::test]
async fn test_upsert_is_idempotent_per_company_and_period() {
    logging::init_test_logging();
    logging::log_test_step("Upserting the same period twice");

    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;

    let first = fixtures::record("2337.TW", "旺宏", "2024-Q3", 20243, 45.0);
    let mut second = first.clone();
    second.debt_ratio = 47.5;
    second.revenue = 2_000.0;

    assert_eq!(cache.upsert_records(&[first]).await.unwrap(), 1);
    assert_eq!(cache.upsert_records(&[second.clone()]).await.unwrap(), 1);

    let stored = cache.records_for_company("2337.TW").await.unwrap();
    assert_eq!(stored, vec![second]);
    assert_eq!(cache.upsert_records(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_latest_for_company_prefers_most_recent_period() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;

    cache
        .upsert_records(&[
            fixtures::record("2337.TW", "旺宏電子", "2023 (FY)", 20235, 52.0),
            fixtures::record("2337.TW", "旺宏電子", "2024-Q3", 20243, 45.0),
            fixtures::record("2337.TW", "旺宏電子", "2024-Q2", 20242, 50.0),
            fixtures::record("AAPL", "Apple Inc.", "2024-Q3", 20243, 80.0),
        ])
        .await
        .unwrap();

    let latest = cache.latest_for_company("旺宏").await.unwrap().unwrap();
    assert_eq!(latest.period_label, "2024-Q3");
    assert_eq!(latest.debt_ratio, 45.0);

    // Case-insensitive on ASCII names, also matches codes
    let apple = cache.latest_for_company("apple").await.unwrap().unwrap();
    assert_eq!(apple.company_code, "AAPL");
    let by_code = cache.latest_for_company("2337").await.unwrap().unwrap();
    assert_eq!(by_code.company_name, "旺宏電子");

    // LIKE wildcards in the query are literal
    assert!(cache.latest_for_company("%").await.unwrap().is_none());
    assert!(cache.latest_for_company("聯電").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_entries_groups_by_company() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    assert!(cache.list_entries().await.unwrap().is_empty());

    cache
        .upsert_records(&[
            fixtures::record("2337.TW", "旺宏", "2024-Q2", 20242, 50.0),
            fixtures::record("2337.TW", "旺宏", "2024-Q3", 20243, 45.0),
            fixtures::record("2330.TW", "台積電", "2023 (FY)", 20235, 30.0),
        ])
        .await
        .unwrap();

    let entries = cache.list_entries().await.unwrap();
    let summary: Vec<(&str, i64, &str)> = entries
        .iter()
        .map(|e| (e.company_code.as_str(), e.periods, e.latest_period.as_str()))
        .collect();
    assert_eq!(summary, vec![("2330.TW", 1, "2023 (FY)"), ("2337.TW", 2, "2024-Q3")]);
}

#[tokio::test]
async fn test_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let cache = open_cache(&dir).await;
        cache
            .upsert_records(&[fixtures::record("2303.TW", "聯電", "2024-Q1", 20241, 35.0)])
            .await
            .unwrap();
    }

    let reopened = open_cache(&dir).await;
    assert_eq!(reopened.records_for_company("2303.TW").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_query_matches_no_company() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    cache
        .upsert_records(&[fixtures::record("AAPL", "Apple Inc.", "2024-Q3", 20243, 80.0)])
        .await
        .unwrap();

    for query in ["", "   ", "\t"] {
        assert!(cache.latest_for_company(query).await.unwrap().is_none(), "query {:?}", query);
    }
    assert!(cache.latest_for_company(" apple ").await.unwrap().is_some());
}
