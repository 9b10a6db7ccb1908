//! Query -> local statements -> table -> cache

use assert_matches::assert_matches;
use fin_metrics::advisor::{assess, RiskFlag, RiskThresholds};
use fin_metrics::api::LocalStatementStore;
use fin_metrics::database::FinancialCache;
use fin_metrics::directory::CompanyDirectory;
use fin_metrics::normalizer::{MetricName, TableBuilder};
use fin_metrics::service::{persist_report, ReportOutcome, ReportService};
use pretty_assertions::assert_eq;
use std::sync::Arc;

use crate::common::{fixtures, logging};

fn service(statements_dir: &std::path::Path) -> ReportService {
    let directory = CompanyDirectory::from_csv_reader(fixtures::listing_csv().as_bytes()).unwrap();
    ReportService::new(
        directory,
        Arc::new(LocalStatementStore::new(statements_dir)),
        TableBuilder::default(),
    )
}

#[tokio::test]
async fn test_report_persist_and_assess() {
    logging::init_test_logging();
    logging::log_test_step("Running report workflow over local statements");

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("2337.TW.json"),
        serde_json::to_string(&fixtures::macronix_json()).unwrap(),
    )
    .unwrap();

    let service = service(dir.path());
    let outcome = service.build_report("旺宏", 1, 1).await.unwrap();
    let report = assert_matches!(outcome, ReportOutcome::Report(report) => report);

    assert_eq!(report.company.code, "2337.TW");
    assert_eq!(report.table.labels(), vec!["2024-Q3", "2023 (FY)"]);
    assert_eq!(report.table.metrics(), &MetricName::CORE[..]);

    let cache = FinancialCache::new(dir.path().join("cache.db")).await.unwrap();
    assert_eq!(persist_report(&cache, &report).await.unwrap(), 2);
    // Persisting the same report again does not duplicate rows
    assert_eq!(persist_report(&cache, &report).await.unwrap(), 2);
    assert_eq!(cache.records_for_company("2337.TW").await.unwrap().len(), 2);

    let latest = cache.latest_for_company("旺宏").await.unwrap().unwrap();
    assert_eq!(latest.period_label, "2024-Q3");
    assert_eq!(latest.operating_cash_flow, 1_500_000.0);

    let strict = RiskThresholds {
        debt_ratio_warning_line: 40.0,
    };
    assert_matches!(
        assess(&latest, &strict).flags.as_slice(),
        [RiskFlag::DebtRatioAboveWarningLine { .. }]
    );
    assert!(assess(&latest, &RiskThresholds::default()).is_clear());
}

#[tokio::test]
async fn test_listed_company_without_statements_is_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = service(dir.path()).build_report("台積電", 4, 3).await.unwrap();
    assert_matches!(outcome, ReportOutcome::NoData { company } if company.code == "2330.TW");
}

#[tokio::test]
async fn test_unlisted_query_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = service(dir.path()).build_report("zzzzqqq", 4, 3).await.unwrap();
    assert_matches!(outcome, ReportOutcome::CompanyNotFound { .. });
}
