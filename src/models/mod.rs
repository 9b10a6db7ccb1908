use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The three financial statements a provider reports per period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Income,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::Income,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Income => "income",
            StatementKind::BalanceSheet => "balance_sheet",
            StatementKind::CashFlow => "cash_flow",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw provider fields for one statement of one reporting period.
///
/// Labels are whatever the provider uses ("Total Revenue", "Total Liab", ...)
/// and values are kept as raw JSON so that numeric strings, nulls and junk
/// survive until the field resolver decides what they mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPeriodDataset {
    fields: BTreeMap<String, Value>,
}

impl RawPeriodDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.fields.get(label)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawPeriodDataset {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Quarter of the calendar year a month falls in (1-4)
pub fn quarter_of_month(month: u32) -> u8 {
    ((month.clamp(1, 12) - 1) / 3 + 1) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Quarter(u8),
    FullYear,
}

/// Reporting period used as a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodIdentifier {
    pub fiscal_year: i32,
    pub kind: PeriodKind,
}

impl PeriodIdentifier {
    /// Quarterly period; `None` unless quarter is 1-4
    pub fn quarter(fiscal_year: i32, quarter: u8) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self {
            fiscal_year,
            kind: PeriodKind::Quarter(quarter),
        })
    }

    /// Quarterly period containing the given period-end date
    pub fn quarter_ending(period_end: NaiveDate) -> Self {
        Self {
            fiscal_year: period_end.year(),
            kind: PeriodKind::Quarter(quarter_of_month(period_end.month())),
        }
    }

    pub fn full_year(fiscal_year: i32) -> Self {
        Self {
            fiscal_year,
            kind: PeriodKind::FullYear,
        }
    }

    pub fn is_quarter(&self) -> bool {
        matches!(self.kind, PeriodKind::Quarter(_))
    }

    /// Column label: `2024-Q3` or `2023 (FY)`
    pub fn label(&self) -> String {
        match self.kind {
            PeriodKind::Quarter(q) => format!("{}-Q{}", self.fiscal_year, q),
            PeriodKind::FullYear => format!("{} (FY)", self.fiscal_year),
        }
    }

    /// Chronological key; a full year sorts after its own Q4
    pub fn sort_key(&self) -> i64 {
        let within_year = match self.kind {
            PeriodKind::Quarter(q) => i64::from(q),
            PeriodKind::FullYear => 5,
        };
        i64::from(self.fiscal_year) * 10 + within_year
    }
}

impl fmt::Display for PeriodIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Income, balance-sheet and cash-flow datasets for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatements {
    pub period: PeriodIdentifier,
    pub income: RawPeriodDataset,
    pub balance_sheet: RawPeriodDataset,
    pub cash_flow: RawPeriodDataset,
}

impl PeriodStatements {
    pub fn new(period: PeriodIdentifier) -> Self {
        Self {
            period,
            income: RawPeriodDataset::new(),
            balance_sheet: RawPeriodDataset::new(),
            cash_flow: RawPeriodDataset::new(),
        }
    }

    pub fn dataset(&self, kind: StatementKind) -> &RawPeriodDataset {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }
}

/// One period as delivered by a financial data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub period_end: NaiveDate,
    #[serde(default)]
    pub income: RawPeriodDataset,
    #[serde(default)]
    pub balance_sheet: RawPeriodDataset,
    #[serde(default)]
    pub cash_flow: RawPeriodDataset,
}

impl StatementPeriod {
    fn to_statements(&self, period: PeriodIdentifier) -> PeriodStatements {
        PeriodStatements {
            period,
            income: self.income.clone(),
            balance_sheet: self.balance_sheet.clone(),
            cash_flow: self.cash_flow.clone(),
        }
    }
}

/// Provider response: quarterly and annual periods, most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementDocument {
    pub symbol: String,
    #[serde(default)]
    pub quarterly: Vec<StatementPeriod>,
    #[serde(default)]
    pub annual: Vec<StatementPeriod>,
}

impl StatementDocument {
    /// Quarterly identifiers followed by annual ones, in source order
    pub fn available_periods(&self) -> Vec<PeriodIdentifier> {
        self.quarterly
            .iter()
            .map(|p| PeriodIdentifier::quarter_ending(p.period_end))
            .chain(
                self.annual
                    .iter()
                    .map(|p| PeriodIdentifier::full_year(p.period_end.year())),
            )
            .collect()
    }

    /// First `quarters` quarterly periods, then the first `years` annual ones
    pub fn select(&self, quarters: usize, years: usize) -> Vec<PeriodStatements> {
        let quarterly = self
            .quarterly
            .iter()
            .take(quarters)
            .map(|p| p.to_statements(PeriodIdentifier::quarter_ending(p.period_end)));
        let annual = self
            .annual
            .iter()
            .take(years)
            .map(|p| p.to_statements(PeriodIdentifier::full_year(p.period_end.year())));
        quarterly.chain(annual).collect()
    }
}

/// Listed company as known to the company directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub code: String,
    pub name: String,
}

impl Company {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Company known only by its stock code
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        Self {
            name: code.clone(),
            code,
        }
    }
}

/// Flattened per-period figures kept in the financial cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub company_code: String,
    pub company_name: String,
    pub period_label: String,
    pub period_sort_key: i64,
    pub revenue: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub operating_cash_flow: f64,
    pub debt_ratio: f64,
}

/// Endpoint, credential and timeout for an external HTTP service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub credential: Option<String>,
    pub timeout: Duration,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub company_listing_path: Option<String>,
    pub statements_dir: Option<String>,
    pub financials: Option<ServiceConfig>,
    pub financials_rate_limit_per_minute: u32,
    pub llm: Option<ServiceConfig>,
    pub llm_model: String,
    pub field_map_path: Option<String>,
    pub debt_ratio_warning_line: f64,
    pub quarters: usize,
    pub annual_years: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let financials = non_empty("FINANCIALS_ENDPOINT").map(|endpoint| ServiceConfig {
            endpoint,
            credential: non_empty("FINANCIALS_API_KEY"),
            timeout: Duration::from_secs(parse_or(&var, "FINANCIALS_TIMEOUT_SECS", 30)),
        });

        let llm = non_empty("LLM_ENDPOINT").map(|endpoint| ServiceConfig {
            endpoint,
            credential: non_empty("LLM_API_KEY"),
            timeout: Duration::from_secs(parse_or(&var, "LLM_TIMEOUT_SECS", 60)),
        });

        let config = Config {
            database_path: non_empty("DATABASE_PATH")
                .unwrap_or_else(|| "financial_cache.db".to_string()),
            company_listing_path: non_empty("COMPANY_LISTING_PATH"),
            statements_dir: non_empty("STATEMENTS_DIR"),
            financials,
            financials_rate_limit_per_minute: parse_or(
                &var,
                "FINANCIALS_RATE_LIMIT_PER_MINUTE",
                60,
            ),
            llm,
            llm_model: non_empty("LLM_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            field_map_path: non_empty("FIELD_MAP_PATH"),
            debt_ratio_warning_line: var("DEBT_RATIO_WARNING_LINE")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(65.0),
            quarters: parse_or(&var, "QUARTERS", 4),
            annual_years: parse_or(&var, "ANNUAL_YEARS", 3),
        };

        if config.financials.is_some() && config.statements_dir.is_some() {
            anyhow::bail!("set either FINANCIALS_ENDPOINT or STATEMENTS_DIR, not both");
        }

        Ok(config)
    }
}

/// Variable parsed into its target type; the default when unset or out of range
fn parse_or<T, F>(var: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
