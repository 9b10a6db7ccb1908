use serde::{Deserialize, Serialize};

use super::field_resolver::{CanonicalField, FieldResolver, ResolvedFields};
use super::metrics::{debt_ratio, MetricCell, MetricName};
use crate::models::{Company, FinancialRecord, PeriodIdentifier, PeriodStatements};

/// One period of the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub period: PeriodIdentifier,
    pub label: String,
    pub fields: ResolvedFields,
    cells: Vec<MetricCell>,
}

/// Metrics (rows, fixed order) by periods (columns, caller order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    metrics: Vec<MetricName>,
    columns: Vec<TableColumn>,
}

impl MetricTable {
    pub fn metrics(&self) -> &[MetricName] {
        &self.metrics
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn cell(&self, metric: MetricName, label: &str) -> Option<&MetricCell> {
        let row = self.metrics.iter().position(|m| *m == metric)?;
        self.columns
            .iter()
            .find(|c| c.label == label)
            .and_then(|c| c.cells.get(row))
    }

    /// Cell value, `0.0` for a metric or period the table does not have
    pub fn value(&self, metric: MetricName, label: &str) -> f64 {
        self.cell(metric, label).map_or(0.0, |c| c.value)
    }

    /// Cells of one metric across all periods
    pub fn row(&self, metric: MetricName) -> Vec<(&str, MetricCell)> {
        self.columns
            .iter()
            .map(|c| {
                let cell = self.metrics
                    .iter()
                    .position(|m| *m == metric)
                    .and_then(|row| c.cells.get(row).copied())
                    .unwrap_or_else(MetricCell::unavailable);
                (c.label.as_str(), cell)
            })
            .collect()
    }

    /// Display string: `52.34%` for ratios, `1,234,567` for amounts
    pub fn formatted(&self, metric: MetricName, label: &str) -> String {
        format_metric(metric, self.value(metric, label))
    }

    /// One persistence record per period
    pub fn to_records(&self, company: &Company) -> Vec<FinancialRecord> {
        self.columns
            .iter()
            .map(|column| {
                let fields = &column.fields;
                FinancialRecord {
                    company_code: company.code.clone(),
                    company_name: company.name.clone(),
                    period_label: column.label.clone(),
                    period_sort_key: column.period.sort_key(),
                    revenue: fields.get(CanonicalField::TotalRevenue),
                    total_assets: fields.get(CanonicalField::TotalAssets),
                    total_liabilities: fields.get(CanonicalField::TotalLiabilities),
                    current_assets: fields.get(CanonicalField::CurrentAssets),
                    current_liabilities: fields.get(CanonicalField::CurrentLiabilities),
                    operating_cash_flow: fields.get(CanonicalField::OperatingCashFlow),
                    debt_ratio: debt_ratio(
                        fields.get(CanonicalField::TotalLiabilities),
                        fields.get(CanonicalField::TotalAssets),
                    ),
                }
            })
            .collect()
    }
}

pub fn format_metric(metric: MetricName, value: f64) -> String {
    if metric.is_ratio() {
        format!("{:.2}%", value)
    } else {
        format_amount(value)
    }
}

/// Whole-number amount with thousands separators
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Result of a table build
#[derive(Debug, Clone, PartialEq)]
pub enum TableOutcome {
    /// The primary period has no income statement at all
    NoData,
    Table(MetricTable),
}

impl TableOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, TableOutcome::NoData)
    }

    pub fn table(&self) -> Option<&MetricTable> {
        match self {
            TableOutcome::Table(table) => Some(table),
            TableOutcome::NoData => None,
        }
    }

    pub fn into_table(self) -> Option<MetricTable> {
        match self {
            TableOutcome::Table(table) => Some(table),
            TableOutcome::NoData => None,
        }
    }
}

/// Builds [`MetricTable`]s from per-period statements
#[derive(Debug, Clone)]
pub struct TableBuilder {
    resolver: FieldResolver,
    metrics: Vec<MetricName>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new(FieldResolver::default(), MetricName::CORE)
    }
}

impl TableBuilder {
    /// Metrics are sorted into display order and de-duplicated
    pub fn new(resolver: FieldResolver, metrics: impl IntoIterator<Item = MetricName>) -> Self {
        let mut metrics: Vec<MetricName> = metrics.into_iter().collect();
        metrics.sort();
        metrics.dedup();
        Self { resolver, metrics }
    }

    pub fn with_extended_metrics(mut self) -> Self {
        self.metrics = MetricName::ALL.to_vec();
        self
    }

    pub fn metrics(&self) -> &[MetricName] {
        &self.metrics
    }

    pub fn build(&self, periods: &[PeriodStatements]) -> TableOutcome {
        match periods.first() {
            None => return TableOutcome::NoData,
            Some(primary) if primary.income.is_empty() => return TableOutcome::NoData,
            Some(_) => {}
        }

        let columns = periods
            .iter()
            .map(|statements| {
                let fields = self.resolver.resolve_all(statements);
                let cells = self.metrics.iter().map(|m| m.compute(&fields)).collect();
                TableColumn {
                    period: statements.period,
                    label: statements.period.label(),
                    fields,
                    cells,
                }
            })
            .collect();

        TableOutcome::Table(MetricTable {
            metrics: self.metrics.clone(),
            columns,
        })
    }
}

/// Build a table with the default field map and the core metrics
pub fn build_table(periods: &[PeriodStatements]) -> TableOutcome {
    TableBuilder::default().build(periods)
}
