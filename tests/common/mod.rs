//! Common test utilities and helpers

use fin_metrics::models::{FinancialRecord, StatementDocument};
use serde_json::{json, Value};

/// Statement fixtures
pub mod fixtures {
    use super::*;

    /// Provider document for 旺宏 with two quarters and two full years.
    ///
    /// The older quarter reports liabilities under a synonym label, a
    /// numeric string and an explicit null; the older year has no balance
    /// sheet at all.
    pub fn macronix_json() -> Value {
        json!({
            "symbol": "2337.TW",
            "quarterly": [
                {
                    "period_end": "2024-09-30",
                    "income": {
                        "Total Revenue": 6_500_000,
                        "Operating Income": -1_200_000,
                        "Net Income": -900_000,
                        "Reconciled Depreciation": 2_100_000
                    },
                    "balance_sheet": {
                        "Total Assets": 100_000_000,
                        "Total Liabilities Net Minority Interest": 45_500_000,
                        "Current Assets": 40_000_000,
                        "Current Liabilities": 20_000_000
                    },
                    "cash_flow": {
                        "Operating Cash Flow": 1_500_000,
                        "Capital Expenditure": -3_000_000,
                        "Depreciation And Amortization": 2_000_000
                    }
                },
                {
                    "period_end": "2024-06-30",
                    "income": {"Total Revenue": "6,100,000", "Operating Income": null},
                    "balance_sheet": {
                        "Total Assets": 98_000_000,
                        "Total Liab": 49_000_000,
                        "Current Assets": "None"
                    },
                    "cash_flow": {"Operating Cash Flow": -250_000}
                }
            ],
            "annual": [
                {
                    "period_end": "2023-12-31",
                    "income": {"Total Revenue": 28_000_000},
                    "balance_sheet": {
                        "Total Assets": 97_000_000,
                        "Total Liabilities": 50_440_000
                    },
                    "cash_flow": {"Operating Cash Flow": 4_000_000}
                },
                {
                    "period_end": "2022-12-31",
                    "income": {"Total Revenue": 39_000_000}
                }
            ]
        })
    }

    pub fn macronix_document() -> StatementDocument {
        serde_json::from_value(macronix_json()).expect("fixture document is valid")
    }

    pub fn listing_csv() -> &'static str {
        "code,name\n2330.TW,台積電\n2337.TW,旺宏\n2303.TW,聯電\nAAPL,Apple Inc.\n"
    }

    pub fn record(
        code: &str,
        name: &str,
        period_label: &str,
        sort_key: i64,
        debt_ratio: f64,
    ) -> FinancialRecord {
        FinancialRecord {
            company_code: code.to_string(),
            company_name: name.to_string(),
            period_label: period_label.to_string(),
            period_sort_key: sort_key,
            revenue: 1_000.0,
            total_assets: 10_000.0,
            total_liabilities: 10_000.0 * debt_ratio / 100.0,
            current_assets: 4_000.0,
            current_liabilities: 2_000.0,
            operating_cash_flow: 500.0,
            debt_ratio,
        }
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test harness may have installed a subscriber already
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("fin_metrics=debug,main=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
